//! I2C (TWI) bus abstractions
//!
//! The external credential EEPROM sits on the TWI bus. The bus trait mirrors
//! the master transactions the EEPROM driver needs: a plain write and a
//! write-then-read with repeated start.

/// Status reported when a TWI transaction step is not acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// START or repeated START was not transmitted
    Start,
    /// Device address not acknowledged
    AddressNack,
    /// Data byte not acknowledged
    DataNack,
    /// Arbitration lost to another master
    ArbitrationLost,
}

/// I2C bus master
pub trait I2cBus {
    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically the word address)
    /// * `read_buf` - Buffer to read into; the last byte is NACKed
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), I2cError>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        (**self).write(address, data)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), I2cError> {
        (**self).write_read(address, write_data, read_buf)
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Own slave address, used when the bus is also addressed as a slave
    pub own_address: u8,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::FAST
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        own_address: 0x01,
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: 400_000,
        own_address: 0x01,
    };

    /// TWBR value for a prescaler of 1
    ///
    /// SCL = CPU / (16 + 2 * TWBR). Returns `None` if the frequency cannot
    /// be reached.
    pub fn bit_rate_register(&self, cpu_hz: u32) -> Option<u8> {
        if self.frequency == 0 {
            return None;
        }
        let ratio = cpu_hz / self.frequency;
        let twbr = ratio.checked_sub(16)? / 2;
        u8::try_from(twbr).ok()
    }
}
