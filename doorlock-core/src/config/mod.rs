//! Configuration types
//!
//! Immutable value objects built once at startup and passed by value. The
//! defaults carry the constants of the deployed firmware.

pub mod types;

pub use types::*;
