//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in doorlock-core and doorlock-hal for the reference boards:
//!
//! - Door motor (H-bridge with PWM speed control)
//! - Alarm buzzer on a GPIO pin
//! - External 24C16 EEPROM over I2C
//! - 4x4 key matrix scanner

#![no_std]
#![deny(unsafe_code)]

pub mod buzzer;
pub mod eeprom;
pub mod keypad;
pub mod motor;

pub use buzzer::GpioBuzzer;
pub use eeprom::At24cEeprom;
pub use keypad::MatrixKeypad;
pub use motor::{DcMotor, DcMotorConfig};
