//! Hardware abstraction traits
//!
//! These traits define the interface between the node logic and the
//! board-specific drivers. The LCD trait lives in `doorlock-display`.

pub mod alarm;
pub mod keypad;
pub mod motor;

pub use alarm::Alarm;
pub use keypad::{Key, Keypad};
pub use motor::{DoorMotor, MotorCommand, MotorError, Rotation};
