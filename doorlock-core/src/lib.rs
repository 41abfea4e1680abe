//! Board-agnostic core logic for the door lock firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (door motor, alarm, keypad)
//! - Control and Interface node state machines and their runtimes
//! - Door phase sequencing driven by timer ticks
//! - Lockout attempt counting and alarm pattern
//! - Credential persistence layout
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

// This must go first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod config;
pub mod door;
pub mod entry;
pub mod error;
pub mod link;
pub mod lockout;
pub mod node;
pub mod state;
pub mod store;
pub mod traits;

pub use config::SystemConfig;
pub use error::{LinkError, NodeError, ProtocolError};
pub use node::{ControlNode, InterfaceNode};
