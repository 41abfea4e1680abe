//! Periodic timer abstractions
//!
//! Both nodes use Timer1 in CTC mode as a coarse tick source: 3 s per tick
//! for the door sequence, 1 s per tick for the lockout countdown. The timer
//! only fires the handler registered for its compare interrupt; all
//! bookkeeping lives in the handler.

use portable_atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::interrupt::InterruptHandler;

/// Clock prescaler applied to the CPU clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    /// Division factor
    pub fn divisor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }
}

/// Periodic timer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Interval between compare interrupts in milliseconds
    pub period_ms: u32,
    /// Clock prescaler
    pub prescaler: Prescaler,
}

impl TimerConfig {
    /// Timer with the given period on the /1024 prescaler
    pub const fn every_ms(period_ms: u32) -> Self {
        Self {
            period_ms,
            prescaler: Prescaler::Div1024,
        }
    }

    /// Compare register value (OCR1A) producing this period
    ///
    /// At 8 MHz and /1024 one timer count is 128 us, so 1 s is 7812 counts
    /// and 3 s is 23436. Returns `None` if the period overflows 16 bits.
    pub fn compare_value(&self, cpu_hz: u32) -> Option<u16> {
        let counts_per_s = (cpu_hz / self.prescaler.divisor()) as u64;
        let counts = counts_per_s * self.period_ms as u64 / 1000;
        u16::try_from(counts).ok().filter(|c| *c > 0)
    }
}

/// Periodic compare-match timer
pub trait PeriodicTimer {
    /// (Re)start the timer from zero and enable its compare interrupt
    fn start(&mut self, config: TimerConfig);

    /// Disable the compare interrupt and halt the counter
    fn stop(&mut self);

    /// Check whether the timer is running
    fn is_running(&self) -> bool;
}

impl<T: PeriodicTimer + ?Sized> PeriodicTimer for &mut T {
    fn start(&mut self, config: TimerConfig) {
        (**self).start(config)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}

/// Elapsed-time counter advanced from a timer interrupt
///
/// Each tick adds `step_s` seconds. The main loop reads the total with
/// [`TickCounter::elapsed_s`]; nothing else is shared with the handler.
pub struct TickCounter {
    elapsed_s: AtomicU16,
    step_s: AtomicU8,
    enabled: AtomicBool,
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickCounter {
    /// Create a disabled counter
    pub const fn new() -> Self {
        Self {
            elapsed_s: AtomicU16::new(0),
            step_s: AtomicU8::new(1),
            enabled: AtomicBool::new(false),
        }
    }

    /// Zero the counter and start counting `step_s` per tick
    pub fn restart(&self, step_s: u8) {
        self.enabled.store(false, Ordering::Release);
        self.elapsed_s.store(0, Ordering::Relaxed);
        self.step_s.store(step_s, Ordering::Relaxed);
        self.enabled.store(true, Ordering::Release);
    }

    /// Stop counting; the current total stays readable
    pub fn halt(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Seconds accumulated since the last restart
    pub fn elapsed_s(&self) -> u16 {
        self.elapsed_s.load(Ordering::Acquire)
    }
}

impl InterruptHandler for TickCounter {
    fn on_interrupt(&self) {
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }
        let step = self.step_s.load(Ordering::Relaxed) as u16;
        let now = self.elapsed_s.load(Ordering::Relaxed).saturating_add(step);
        self.elapsed_s.store(now, Ordering::Release);
    }
}
