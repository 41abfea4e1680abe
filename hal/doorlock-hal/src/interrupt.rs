//! Interrupt handler registration
//!
//! Each interrupt vector owns exactly one handler slot. Board code calls
//! [`HandlerTable::dispatch`] from the vector; application code installs the
//! handler for a source with [`HandlerTable::set_handler`]. Handlers are
//! shared references to `Sync` state, so they can only touch atomics or
//! critical-section cells.

use core::cell::Cell;

use critical_section::Mutex;

/// Work performed when an interrupt fires
pub trait InterruptHandler: Sync {
    /// Called from the interrupt vector with interrupts disabled
    fn on_interrupt(&self);
}

/// Interrupt sources the door lock firmware hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum InterruptSource {
    /// External interrupt 0
    Int0 = 0,
    /// External interrupt 1
    Int1 = 1,
    /// External interrupt 2
    Int2 = 2,
    /// Timer1 compare match A
    Timer1CompareA = 3,
    /// Timer1 compare match B
    Timer1CompareB = 4,
    /// USART receive complete
    UsartRxComplete = 5,
    /// USART transmit complete
    UsartTxComplete = 6,
}

impl InterruptSource {
    /// Number of hookable sources
    pub const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }
}

type Slot<'a> = Mutex<Cell<Option<&'a dyn InterruptHandler>>>;

/// One handler slot per [`InterruptSource`]
pub struct HandlerTable<'a> {
    slots: [Slot<'a>; InterruptSource::COUNT],
}

impl Default for HandlerTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> HandlerTable<'a> {
    /// Create a table with every slot empty
    pub const fn new() -> Self {
        Self {
            slots: [
                Mutex::new(Cell::new(None)),
                Mutex::new(Cell::new(None)),
                Mutex::new(Cell::new(None)),
                Mutex::new(Cell::new(None)),
                Mutex::new(Cell::new(None)),
                Mutex::new(Cell::new(None)),
                Mutex::new(Cell::new(None)),
            ],
        }
    }

    /// Install the handler for `source`, returning the one it replaces
    pub fn set_handler(
        &self,
        source: InterruptSource,
        handler: &'a dyn InterruptHandler,
    ) -> Option<&'a dyn InterruptHandler> {
        critical_section::with(|cs| self.slots[source.index()].borrow(cs).replace(Some(handler)))
    }

    /// Remove the handler for `source`
    pub fn clear_handler(&self, source: InterruptSource) -> Option<&'a dyn InterruptHandler> {
        critical_section::with(|cs| self.slots[source.index()].borrow(cs).take())
    }

    /// Check whether `source` has a handler installed
    pub fn is_set(&self, source: InterruptSource) -> bool {
        critical_section::with(|cs| self.slots[source.index()].borrow(cs).get().is_some())
    }

    /// Run the handler for `source`
    ///
    /// Returns `false` if no handler is installed (the interrupt is dropped).
    pub fn dispatch(&self, source: InterruptSource) -> bool {
        let handler = critical_section::with(|cs| self.slots[source.index()].borrow(cs).get());
        match handler {
            Some(handler) => {
                handler.on_interrupt();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portable_atomic::{AtomicU8, Ordering};

    struct Counter(AtomicU8);

    impl InterruptHandler for Counter {
        fn on_interrupt(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_dispatch_without_handler() {
        let table = HandlerTable::new();
        assert!(!table.dispatch(InterruptSource::Timer1CompareA));
    }

    #[test]
    fn test_dispatch_routes_to_source() {
        let timer = Counter(AtomicU8::new(0));
        let rx = Counter(AtomicU8::new(0));
        let table = HandlerTable::new();

        table.set_handler(InterruptSource::Timer1CompareA, &timer);
        table.set_handler(InterruptSource::UsartRxComplete, &rx);

        assert!(table.dispatch(InterruptSource::Timer1CompareA));
        assert!(table.dispatch(InterruptSource::Timer1CompareA));
        assert!(table.dispatch(InterruptSource::UsartRxComplete));
        assert!(!table.dispatch(InterruptSource::Int0));

        assert_eq!(timer.0.load(Ordering::Relaxed), 2);
        assert_eq!(rx.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_replace_and_clear() {
        let first = Counter(AtomicU8::new(0));
        let second = Counter(AtomicU8::new(0));
        let table = HandlerTable::new();

        assert!(table
            .set_handler(InterruptSource::Int1, &first)
            .is_none());
        assert!(table
            .set_handler(InterruptSource::Int1, &second)
            .is_some());

        table.dispatch(InterruptSource::Int1);
        assert_eq!(first.0.load(Ordering::Relaxed), 0);
        assert_eq!(second.0.load(Ordering::Relaxed), 1);

        assert!(table.clear_handler(InterruptSource::Int1).is_some());
        assert!(!table.is_set(InterruptSource::Int1));
    }
}
