//! Alarm buzzer trait

/// Audible alarm
pub trait Alarm {
    /// Start sounding
    fn on(&mut self);

    /// Stop sounding
    fn off(&mut self);

    /// Check if the alarm is sounding
    fn is_on(&self) -> bool;
}

impl<T: Alarm + ?Sized> Alarm for &mut T {
    fn on(&mut self) {
        (**self).on()
    }

    fn off(&mut self) {
        (**self).off()
    }

    fn is_on(&self) -> bool {
        (**self).is_on()
    }
}
