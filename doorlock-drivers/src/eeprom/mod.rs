//! External EEPROM drivers

pub mod at24c;

pub use at24c::At24cEeprom;
