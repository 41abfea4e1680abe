//! DC motor driver with PWM speed control
//!
//! This driver provides:
//! - Direction control through the two H-bridge inputs
//! - PWM duty cycle control (0-100%) on the bridge enable
//! - Minimum duty cycle handling (below which the motor won't start)
//!
//! # Usage
//!
//! ```ignore
//! let mut motor = DcMotor::new(in1, in2, pwm, DcMotorConfig::default())?;
//! motor.drive(MotorCommand::clockwise(100))?;
//! motor.stop()?;
//! ```

use embedded_hal::pwm::SetDutyCycle;

use doorlock_core::traits::{DoorMotor, MotorCommand, MotorError, Rotation};
use doorlock_hal::gpio::OutputPin;

/// DC motor driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DcMotorConfig {
    /// Minimum duty cycle percentage (below this the motor won't start)
    pub min_duty: u8,
}

impl Default for DcMotorConfig {
    fn default() -> Self {
        Self { min_duty: 0 }
    }
}

/// H-bridge DC motor
///
/// `in1` high turns the shaft clockwise, `in2` high turns it anticlockwise.
/// Both low brakes the motor.
pub struct DcMotor<A, B, P> {
    in1: A,
    in2: B,
    pwm: P,
    config: DcMotorConfig,
    current: MotorCommand,
}

impl<A, B, P> DcMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    /// Create a new driver with the motor stopped
    pub fn new(in1: A, in2: B, pwm: P, config: DcMotorConfig) -> Result<Self, MotorError> {
        let mut motor = Self {
            in1,
            in2,
            pwm,
            config,
            current: MotorCommand::STOP,
        };
        motor.drive(MotorCommand::STOP)?;
        Ok(motor)
    }

    /// Get the configuration
    pub fn config(&self) -> &DcMotorConfig {
        &self.config
    }

    /// Release the pins and PWM channel
    pub fn release(self) -> (A, B, P) {
        (self.in1, self.in2, self.pwm)
    }

    /// Scale the speed percentage to actual duty cycle
    ///
    /// Maps 0-100% to min_duty-100%, so that 0% = off and 100% = full power,
    /// with the dead zone below min_duty handled.
    fn scale_duty(&self, speed: u8) -> u8 {
        if speed == 0 {
            0
        } else {
            let min = self.config.min_duty.min(100) as u32;
            let range = 100 - min;
            let scaled = min + (speed as u32 * range / 100);
            scaled.min(100) as u8
        }
    }
}

impl<A, B, P> DoorMotor for DcMotor<A, B, P>
where
    A: OutputPin,
    B: OutputPin,
    P: SetDutyCycle,
{
    fn drive(&mut self, command: MotorCommand) -> Result<(), MotorError> {
        if command.speed_percent > 100 {
            return Err(MotorError::InvalidSpeed);
        }

        // Both inputs go low first so the bridge never sees both high
        self.in1.set_low();
        self.in2.set_low();
        match command.rotation {
            Rotation::Stop => {}
            Rotation::Clockwise => self.in1.set_high(),
            Rotation::AntiClockwise => self.in2.set_high(),
        }

        let duty = match command.rotation {
            Rotation::Stop => 0,
            _ => self.scale_duty(command.speed_percent),
        };
        self.pwm
            .set_duty_cycle_percent(duty)
            .map_err(|_| MotorError::Driver)?;

        self.current = command;
        Ok(())
    }

    fn current(&self) -> MotorCommand {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::pwm::ErrorType;

    struct MockPin {
        high: bool,
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    /// 8-bit PWM like Timer0 on the ATmega32
    struct MockPwm {
        duty: u16,
    }

    impl ErrorType for MockPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            255
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    fn motor(config: DcMotorConfig) -> DcMotor<MockPin, MockPin, MockPwm> {
        DcMotor::new(
            MockPin { high: true },
            MockPin { high: true },
            MockPwm { duty: 99 },
            config,
        )
        .unwrap()
    }

    #[test]
    fn test_starts_stopped() {
        let motor = motor(DcMotorConfig::default());
        assert_eq!(motor.current(), MotorCommand::STOP);
        let (in1, in2, pwm) = motor.release();
        assert!(!in1.high && !in2.high);
        assert_eq!(pwm.duty, 0);
    }

    #[test]
    fn test_directions() {
        let mut motor = motor(DcMotorConfig::default());

        motor.drive(MotorCommand::clockwise(100)).unwrap();
        assert!(motor.in1.high && !motor.in2.high);
        assert_eq!(motor.pwm.duty, 255);

        motor.drive(MotorCommand::anticlockwise(100)).unwrap();
        assert!(!motor.in1.high && motor.in2.high);

        motor.stop().unwrap();
        assert!(!motor.in1.high && !motor.in2.high);
        assert_eq!(motor.pwm.duty, 0);
        assert!(!motor.current().is_moving());
    }

    #[test]
    fn test_rejects_overspeed() {
        let mut motor = motor(DcMotorConfig::default());
        motor.drive(MotorCommand::clockwise(50)).unwrap();
        assert_eq!(
            motor.drive(MotorCommand::clockwise(101)),
            Err(MotorError::InvalidSpeed)
        );
        assert_eq!(motor.current(), MotorCommand::clockwise(50));
    }

    #[test]
    fn test_duty_scaling() {
        let mut motor = motor(DcMotorConfig { min_duty: 20 });

        // 50% should be scaled: 20 + (50% of 80) = 60% of 255
        motor.drive(MotorCommand::clockwise(50)).unwrap();
        assert_eq!(motor.pwm.duty, 153);

        motor.drive(MotorCommand::clockwise(0)).unwrap();
        assert_eq!(motor.pwm.duty, 0);
    }
}
