//! AT24C16 I2C EEPROM driver
//!
//! 2 KiB organised as eight 256-byte blocks. The block number (address bits
//! A8..A10) travels in the low three bits of the device address and the
//! word address carries A0..A7. Writes are buffered per 16-byte page and
//! take up to 10 ms to commit, during which the device ignores the bus.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use doorlock_hal::eeprom::{ByteStore, StoreError};
use doorlock_hal::i2c::I2cBus;

/// Device address with all block bits clear
pub const BASE_ADDRESS: u8 = 0x50;

/// Bytes per write page
pub const PAGE_SIZE: usize = 16;

/// Device size in bytes
pub const CAPACITY: u16 = 2048;

/// Worst-case internal write cycle
pub const WRITE_CYCLE_MS: u32 = 10;

/// AT24C16 on an I2C bus
pub struct At24cEeprom<I, D> {
    bus: I,
    delay: D,
}

impl<I: I2cBus, D: DelayNs> At24cEeprom<I, D> {
    /// Create a driver; `delay` waits out the write cycle
    pub fn new(bus: I, delay: D) -> Self {
        Self { bus, delay }
    }

    /// Release the bus and delay
    pub fn release(self) -> (I, D) {
        (self.bus, self.delay)
    }

    /// Device address selecting the block that holds `address`
    pub fn device_address(address: u16) -> u8 {
        BASE_ADDRESS | ((address >> 8) & 0x07) as u8
    }

    /// Check that `len` bytes from `address` sit inside one page
    fn check_page(address: u16, len: usize) -> Result<(), StoreError> {
        let offset = address as usize % PAGE_SIZE;
        let end = address as usize + len;
        if len > PAGE_SIZE || offset + len > PAGE_SIZE || end > CAPACITY as usize {
            return Err(StoreError::OutOfRange);
        }
        Ok(())
    }

    /// Read up to one page starting at `address`
    pub fn read_page(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        Self::check_page(address, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        self.bus
            .write_read(Self::device_address(address), &[address as u8], buf)
            .map_err(|_| StoreError::Bus)
    }

    /// Write up to one page starting at `address` and wait for the commit
    pub fn write_page(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        Self::check_page(address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let mut frame: Vec<u8, { PAGE_SIZE + 1 }> = Vec::new();
        // Both fit: check_page bounds data to one page
        let _ = frame.push(address as u8);
        let _ = frame.extend_from_slice(data);
        self.bus
            .write(Self::device_address(address), &frame)
            .map_err(|_| StoreError::Bus)?;
        self.delay.delay_ms(WRITE_CYCLE_MS);
        Ok(())
    }
}

impl<I: I2cBus, D: DelayNs> ByteStore for At24cEeprom<I, D> {
    fn read_byte(&mut self, address: u16) -> Result<u8, StoreError> {
        let mut buf = [0u8; 1];
        self.read_page(address, &mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), StoreError> {
        self.write_page(address, &[value])
    }

    fn read_into(&mut self, address: u16, buf: &mut [u8]) -> Result<(), StoreError> {
        let mut address = address;
        let mut rest = buf;
        while !rest.is_empty() {
            let room = PAGE_SIZE - address as usize % PAGE_SIZE;
            let (chunk, tail) = rest.split_at_mut(room.min(rest.len()));
            self.read_page(address, chunk)?;
            address = address.saturating_add(chunk.len() as u16);
            rest = tail;
        }
        Ok(())
    }

    fn write_from(&mut self, address: u16, data: &[u8]) -> Result<(), StoreError> {
        let mut address = address;
        let mut rest = data;
        while !rest.is_empty() {
            let room = PAGE_SIZE - address as usize % PAGE_SIZE;
            let (chunk, tail) = rest.split_at(room.min(rest.len()));
            self.write_page(address, chunk)?;
            address = address.saturating_add(chunk.len() as u16);
            rest = tail;
        }
        Ok(())
    }
}
