//! Doorlock Hardware Abstraction Layer
//!
//! This crate defines the narrow peripheral traits the door lock nodes are
//! written against. A board crate (ATmega32 on the reference hardware)
//! implements them on top of its registers; host tests implement them with
//! in-memory fakes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  doorlock-core (Control / Interface)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  doorlock-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ board support │       │  host fakes   │
//! │  (ATmega32)   │       │ (tests, sim)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`uart::SerialLink`] - Byte-oriented serial link
//! - [`i2c::I2cBus`] - TWI bus operations
//! - [`eeprom::ByteStore`] - Byte-addressable persistent storage
//! - [`timer::PeriodicTimer`] - Periodic compare-match timer
//! - [`interrupt::InterruptHandler`] - Handlers registered per interrupt source

#![no_std]
#![deny(unsafe_code)]

pub mod eeprom;
pub mod gpio;
pub mod i2c;
pub mod interrupt;
pub mod timer;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use eeprom::{ByteStore, StoreError};
pub use gpio::{InputPin, OutputPin};
pub use i2c::{I2cBus, I2cError};
pub use interrupt::{HandlerTable, InterruptHandler, InterruptSource};
pub use timer::{PeriodicTimer, TickCounter, TimerConfig};
pub use uart::{RxSlot, SerialLink};
