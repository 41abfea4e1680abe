//! Motor driver implementations
//!
//! The door is moved by a brushed DC motor behind an L293D-style H-bridge:
//! two direction inputs and a PWM enable.

pub mod dc;

pub use dc::{DcMotor, DcMotorConfig};
