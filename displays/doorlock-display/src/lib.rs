//! Display abstraction and shared components for Doorlock
//!
//! This crate provides:
//! - `TextDisplay` trait for HD44780-class character LCDs
//! - `DisplayExt` helpers (centred text, two-line messages, progress bars)
//! - `Screen`, an in-memory 16x2 display used by simulations and tests
//!
//! # Architecture
//!
//! The Interface node renders every prompt through `TextDisplay`. A board
//! crate implements it on top of the LCD controller; the controller command
//! sequences stay in that crate. Custom glyphs are addressed by their CGRAM
//! slot (0..=7) and written as the matching control character.

#![no_std]
#![deny(unsafe_code)]

pub mod backend;
pub mod progress;
pub mod screen;

// Re-export key types
pub use backend::{DisplayError, DisplayExt, TextDisplay};
pub use progress::{ProgressBar, BAR_GLYPHS};
pub use screen::{Screen, SCREEN_COLS, SCREEN_ROWS};
