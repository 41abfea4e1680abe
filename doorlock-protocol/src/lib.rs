//! Doorlock Node Communication Protocol
//!
//! This crate defines the UART protocol between the Control node (motor,
//! alarm, credential EEPROM) and the Interface node (LCD and keypad).
//!
//! # Protocol Overview
//!
//! Every message is a single marker byte. The only multi-byte message is a
//! credential, which always follows a marker announcing it:
//! ```text
//! ┌────────┐   ┌──────┬──────┬──────┬──────┐
//! │ MARKER │ → │ b0   │ b1   │ b2   │ b3   │  (credential, LSB first)
//! │ 1B     │   │      │      │      │      │
//! └────────┘   └──────┴──────┴──────┴──────┘
//! ```
//!
//! There is no framing and no checksum. Exchanges are strict turn-taking:
//! a node never sends out of turn and never proceeds past a receive point
//! before the expected byte has arrived.

#![no_std]
#![deny(unsafe_code)]

pub mod credential;
pub mod marker;

pub use credential::{Credential, CredentialError, CredentialReader, CREDENTIAL_SIZE, MAX_DIGITS};
pub use marker::Marker;
