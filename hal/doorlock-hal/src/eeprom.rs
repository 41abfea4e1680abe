//! Byte-addressable persistent storage
//!
//! The Control node keeps its credential and the provisioned flag in an
//! EEPROM. Only single-byte reads and writes are required; implementations
//! take care of device write-cycle timing.

/// Errors from persistent storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Bus transaction failed (start, address or data not acknowledged)
    Bus,
    /// Address outside the device
    OutOfRange,
    /// Write did not stick (read-back mismatch)
    Verify,
}

/// Persistent byte store
///
/// Values survive power loss. Addresses are device-linear.
pub trait ByteStore {
    /// Read the byte at `address`
    fn read_byte(&mut self, address: u16) -> Result<u8, StoreError>;

    /// Write `value` at `address`
    ///
    /// Returns once the device has committed the byte.
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), StoreError>;

    /// Read consecutive bytes starting at `address`
    fn read_into(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        for (offset, slot) in buf.iter_mut().enumerate() {
            let addr = offset_address(address, offset)?;
            *slot = self.read_byte(addr)?;
        }
        Ok(())
    }

    /// Write consecutive bytes starting at `address`
    fn write_from(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        for (offset, &value) in data.iter().enumerate() {
            let addr = offset_address(address, offset)?;
            self.write_byte(addr, value)?;
        }
        Ok(())
    }
}

impl<T: ByteStore + ?Sized> ByteStore for &mut T {
    fn read_byte(&mut self, address: u16) -> Result<u8, StoreError> {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), StoreError> {
        (**self).write_byte(address, value)
    }

    fn read_into(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        (**self).read_into(address, buf)
    }

    fn write_from(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        (**self).write_from(address, data)
    }
}

fn offset_address(base: u16, offset: usize) -> Result<u16, StoreError> {
    u16::try_from(offset)
        .ok()
        .and_then(|o| base.checked_add(o))
        .ok_or(StoreError::OutOfRange)
}

/// Fixed-size RAM-backed store
///
/// Stands in for the EEPROM in host tests and simulations. Fresh cells read
/// as zero, like an EEPROM that was erased to 0x00 by the programmer.
#[derive(Debug, Clone)]
pub struct RamStore<const N: usize> {
    cells: [u8; N],
    writes: u32,
}

impl<const N: usize> Default for RamStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamStore<N> {
    /// Create a zero-filled store
    pub const fn new() -> Self {
        Self {
            cells: [0; N],
            writes: 0,
        }
    }

    /// Raw view of the cells
    pub fn cells(&self) -> &[u8; N] {
        &self.cells
    }

    /// Number of byte writes performed
    pub fn write_count(&self) -> u32 {
        self.writes
    }
}

impl<const N: usize> ByteStore for RamStore<N> {
    fn read_byte(&mut self, address: u16) -> Result<u8, StoreError> {
        self.cells
            .get(address as usize)
            .copied()
            .ok_or(StoreError::OutOfRange)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), StoreError> {
        let cell = self
            .cells
            .get_mut(address as usize)
            .ok_or(StoreError::OutOfRange)?;
        *cell = value;
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }
}
