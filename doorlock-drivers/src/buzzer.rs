//! GPIO alarm buzzer
//!
//! An active buzzer switched by a GPIO pin (directly or via a transistor).

use doorlock_core::traits::Alarm;
use doorlock_hal::gpio::{OutputPin, Polarity};

/// Buzzer on a GPIO pin
///
/// The pin can be wired active-high (default) or active-low.
pub struct GpioBuzzer<P> {
    pin: P,
    polarity: Polarity,
    /// Current logical state (true = sounding)
    on: bool,
}

impl<P: OutputPin> GpioBuzzer<P> {
    /// Create a silent buzzer
    pub fn new(pin: P, polarity: Polarity) -> Self {
        let mut buzzer = Self {
            pin,
            polarity,
            on: false,
        };
        buzzer.off();
        buzzer
    }

    /// Create a buzzer driven high when sounding
    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, Polarity::ActiveHigh)
    }

    /// Create a buzzer driven low when sounding
    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, Polarity::ActiveLow)
    }

    fn apply(&mut self, on: bool) {
        self.on = on;
        self.pin.set_state(self.polarity.level(on));
    }
}

impl<P: OutputPin> Alarm for GpioBuzzer<P> {
    fn on(&mut self) {
        self.apply(true);
    }

    fn off(&mut self) {
        self.apply(false);
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_active_high_buzzer() {
        let mut buzzer = GpioBuzzer::new_active_high(MockPin { high: true });

        // Initially silent
        assert!(!buzzer.is_on());
        assert!(!buzzer.pin.is_set_high());

        buzzer.on();
        assert!(buzzer.is_on());
        assert!(buzzer.pin.is_set_high());

        buzzer.off();
        assert!(!buzzer.is_on());
        assert!(!buzzer.pin.is_set_high());
    }

    #[test]
    fn test_active_low_buzzer() {
        let mut buzzer = GpioBuzzer::new_active_low(MockPin { high: false });

        // Silent means the pin idles high
        assert!(!buzzer.is_on());
        assert!(buzzer.pin.is_set_high());

        buzzer.on();
        assert!(!buzzer.pin.is_set_high());
    }
}
