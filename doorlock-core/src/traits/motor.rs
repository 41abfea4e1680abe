//! Door motor trait
//!
//! The door is moved by a DC motor through an H-bridge: one direction opens,
//! the other closes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rotation of the door motor shaft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    /// Both bridge inputs low
    #[default]
    Stop,
    /// Opening direction
    Clockwise,
    /// Closing direction
    AntiClockwise,
}

/// Errors that can occur with motor operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Speed above 100%
    InvalidSpeed,
    /// Driver rejected the command (PWM or bridge fault)
    Driver,
}

/// Motor direction and speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorCommand {
    /// Shaft rotation
    pub rotation: Rotation,
    /// Speed as percent of full duty (0-100)
    pub speed_percent: u8,
}

impl MotorCommand {
    /// Motor off
    pub const STOP: Self = Self {
        rotation: Rotation::Stop,
        speed_percent: 0,
    };

    /// Turn clockwise at the given speed
    pub const fn clockwise(speed_percent: u8) -> Self {
        Self {
            rotation: Rotation::Clockwise,
            speed_percent,
        }
    }

    /// Turn anticlockwise at the given speed
    pub const fn anticlockwise(speed_percent: u8) -> Self {
        Self {
            rotation: Rotation::AntiClockwise,
            speed_percent,
        }
    }

    /// Check if this command leaves the shaft turning
    pub fn is_moving(&self) -> bool {
        self.rotation != Rotation::Stop && self.speed_percent > 0
    }
}

/// Door motor driver
pub trait DoorMotor {
    /// Apply a direction and speed
    fn drive(&mut self, command: MotorCommand) -> Result<(), MotorError>;

    /// Last command applied
    fn current(&self) -> MotorCommand;

    /// Stop the motor
    fn stop(&mut self) -> Result<(), MotorError> {
        self.drive(MotorCommand::STOP)
    }
}

impl<T: DoorMotor + ?Sized> DoorMotor for &mut T {
    fn drive(&mut self, command: MotorCommand) -> Result<(), MotorError> {
        (**self).drive(command)
    }

    fn current(&self) -> MotorCommand {
        (**self).current()
    }
}
