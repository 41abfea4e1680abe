//! Virtual time

use std::cell::Cell;

use embedded_hal::delay::DelayNs;

use doorlock_hal::interrupt::{HandlerTable, InterruptHandler, InterruptSource};
use doorlock_hal::timer::{PeriodicTimer, TimerConfig};

/// Interrupt raised by the simulated compare-match timer
const TIMER_SOURCE: InterruptSource = InterruptSource::Timer1CompareA;

#[derive(Debug, Clone, Copy)]
struct Running {
    period_ms: u64,
    next_ms: u64,
}

/// Virtual millisecond clock with one periodic timer
///
/// Time only moves when a [`SimDelay`] sleeps. Every timer period crossed
/// while sleeping dispatches the handler registered for the timer
/// interrupt.
pub struct SimClock<'a> {
    now_ms: Cell<u64>,
    timer: Cell<Option<Running>>,
    handlers: HandlerTable<'a>,
    fired: Cell<u64>,
}

impl Default for SimClock<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SimClock<'a> {
    /// Clock at zero with the timer stopped and no handler
    pub fn new() -> Self {
        Self {
            now_ms: Cell::new(0),
            timer: Cell::new(None),
            handlers: HandlerTable::new(),
            fired: Cell::new(0),
        }
    }

    /// Register the timer interrupt handler
    pub fn attach(&self, handler: &'a dyn InterruptHandler) {
        self.handlers.set_handler(TIMER_SOURCE, handler);
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    /// Timer interrupts dispatched so far
    pub fn interrupts(&self) -> u64 {
        self.fired.get()
    }

    /// Move time forward, firing the timer for every period crossed
    pub fn advance(&self, ms: u64) {
        let target = self.now_ms.get() + ms;
        while let Some(mut running) = self.timer.get() {
            if running.next_ms > target {
                break;
            }
            self.now_ms.set(running.next_ms);
            running.next_ms += running.period_ms;
            self.timer.set(Some(running));
            self.handlers.dispatch(TIMER_SOURCE);
            self.fired.set(self.fired.get() + 1);
        }
        self.now_ms.set(target);
    }

    fn start(&self, config: TimerConfig) {
        let period_ms = u64::from(config.period_ms.max(1));
        self.timer.set(Some(Running {
            period_ms,
            next_ms: self.now_ms.get() + period_ms,
        }));
    }

    fn stop(&self) {
        self.timer.set(None);
    }

    fn is_running(&self) -> bool {
        self.timer.get().is_some()
    }
}

/// Compare-match timer driven by a [`SimClock`]
pub struct SimTimer<'c, 'a>(&'c SimClock<'a>);

impl<'c, 'a> SimTimer<'c, 'a> {
    /// Timer on `clock`
    pub fn new(clock: &'c SimClock<'a>) -> Self {
        Self(clock)
    }
}

impl PeriodicTimer for SimTimer<'_, '_> {
    fn start(&mut self, config: TimerConfig) {
        self.0.start(config);
    }

    fn stop(&mut self) {
        self.0.stop();
    }

    fn is_running(&self) -> bool {
        self.0.is_running()
    }
}

/// Delay that advances a [`SimClock`]
///
/// Each sleep also yields the thread so the peer node gets to run while
/// this one is polling.
pub struct SimDelay<'c, 'a>(&'c SimClock<'a>);

impl<'c, 'a> SimDelay<'c, 'a> {
    /// Delay on `clock`
    pub fn new(clock: &'c SimClock<'a>) -> Self {
        Self(clock)
    }
}

impl DelayNs for SimDelay<'_, '_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(u64::from(ns / 1_000_000));
        std::thread::yield_now();
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance(u64::from(ms));
        std::thread::yield_now();
    }
}
