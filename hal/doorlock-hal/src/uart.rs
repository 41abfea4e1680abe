//! UART serial communication abstractions
//!
//! The door lock protocol is a strict byte-at-a-time exchange, so the link
//! trait works on single bytes. Two receive styles are supported:
//!
//! - polled: [`SerialLink::try_receive`] reads the data register if the
//!   receive-complete flag is set
//! - interrupt: the RX-complete vector pushes the byte into an [`RxSlot`]
//!   and the main loop drains it through [`SlotReceiver`]

use core::cell::Cell;

use critical_section::Mutex;
use portable_atomic::{AtomicU8, Ordering};

/// Byte-oriented duplex serial link
pub trait SerialLink {
    /// Error type for link operations
    type Error;

    /// Send one byte
    ///
    /// Blocks until the byte has been handed to the transmitter.
    fn send(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Receive one byte if one is available
    ///
    /// Returns `Ok(None)` immediately when nothing has arrived.
    fn try_receive(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Receive one byte, spinning until it arrives
    fn receive(&mut self) -> Result<u8, Self::Error> {
        loop {
            if let Some(byte) = self.try_receive()? {
                return Ok(byte);
            }
            core::hint::spin_loop();
        }
    }

    /// Send a sequence of bytes in order
    fn send_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            self.send(byte)?;
        }
        Ok(())
    }
}

impl<T: SerialLink + ?Sized> SerialLink for &mut T {
    type Error = T::Error;

    fn send(&mut self, byte: u8) -> Result<(), Self::Error> {
        (**self).send(byte)
    }

    fn try_receive(&mut self) -> Result<Option<u8>, Self::Error> {
        (**self).try_receive()
    }

    fn receive(&mut self) -> Result<u8, Self::Error> {
        (**self).receive()
    }

    fn send_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).send_all(bytes)
    }
}

/// Single-slot receive buffer filled from the RX-complete interrupt
///
/// Holds at most one unread byte. A byte delivered while the slot is still
/// full replaces the unread one and bumps the overrun counter.
pub struct RxSlot {
    slot: Mutex<Cell<Option<u8>>>,
    overruns: AtomicU8,
}

impl Default for RxSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl RxSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
            overruns: AtomicU8::new(0),
        }
    }

    /// Store a freshly received byte (called from the RX-complete vector)
    pub fn deliver(&self, byte: u8) {
        let previous = critical_section::with(|cs| self.slot.borrow(cs).replace(Some(byte)));
        if previous.is_some() {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take the pending byte, leaving the slot empty
    pub fn take(&self) -> Option<u8> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }

    /// Check whether a byte is waiting
    pub fn has_new_byte(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).get().is_some())
    }

    /// Drop any pending byte
    pub fn clear(&self) {
        critical_section::with(|cs| self.slot.borrow(cs).set(None));
    }

    /// Number of bytes overwritten before the main loop read them
    pub fn overruns(&self) -> u8 {
        self.overruns.load(Ordering::Relaxed)
    }
}

/// Link adapter that transmits through a polled link and receives from an
/// interrupt-fed [`RxSlot`]
pub struct SlotReceiver<'a, L> {
    tx: L,
    slot: &'a RxSlot,
}

impl<'a, L: SerialLink> SlotReceiver<'a, L> {
    /// Wrap a transmitter and the slot its RX interrupt fills
    pub fn new(tx: L, slot: &'a RxSlot) -> Self {
        Self { tx, slot }
    }

    /// Release the wrapped transmitter
    pub fn release(self) -> L {
        self.tx
    }
}

impl<L: SerialLink> SerialLink for SlotReceiver<'_, L> {
    type Error = L::Error;

    fn send(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.tx.send(byte)
    }

    fn try_receive(&mut self) -> Result<Option<u8>, Self::Error> {
        Ok(self.slot.take())
    }
}

/// UART configuration
///
/// Built once at init and passed by value to the board UART driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Use the U2X double-speed divider
    pub double_speed: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            double_speed: true,
        }
    }
}

impl SerialConfig {
    /// Baud rate register value for the given CPU clock
    ///
    /// Rounds to the nearest divider. Returns `None` when the requested
    /// rate cannot be reached from `cpu_hz`.
    pub fn baud_divider(&self, cpu_hz: u32) -> Option<u16> {
        if self.baudrate == 0 {
            return None;
        }
        let samples = if self.double_speed { 8 } else { 16 };
        let denom = samples * self.baudrate;
        let ubrr = (cpu_hz + denom / 2) / denom;
        if ubrr == 0 {
            return None;
        }
        u16::try_from(ubrr - 1).ok().filter(|v| *v <= 0x0FFF)
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
