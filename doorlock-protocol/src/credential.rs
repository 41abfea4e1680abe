//! Credential payload
//!
//! A credential is a numeric password of up to five digits. On the wire and
//! in the EEPROM it is four raw bytes, least significant first.

use heapless::Vec;

/// Payload size in bytes
pub const CREDENTIAL_SIZE: usize = 4;

/// Maximum number of password digits
pub const MAX_DIGITS: usize = 5;

/// Errors building a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CredentialError {
    /// Value above [`Credential::MAX`]
    OutOfRange,
    /// More than [`MAX_DIGITS`] digits
    TooManyDigits,
    /// Digit value above 9
    InvalidDigit,
}

/// Numeric password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credential(u32);

impl Credential {
    /// Largest credential a five-digit entry can produce
    pub const MAX: u32 = 99_999;

    /// Create a credential from its numeric value
    pub fn new(value: u32) -> Result<Self, CredentialError> {
        if value > Self::MAX {
            return Err(CredentialError::OutOfRange);
        }
        Ok(Self(value))
    }

    /// Build a credential from entered digits, most significant first
    ///
    /// Leading zeros are not significant: `[0, 0, 1]` and `[1]` are equal.
    pub fn from_digits(digits: &[u8]) -> Result<Self, CredentialError> {
        if digits.len() > MAX_DIGITS {
            return Err(CredentialError::TooManyDigits);
        }
        let mut value = 0u32;
        for &digit in digits {
            if digit > 9 {
                return Err(CredentialError::InvalidDigit);
            }
            value = value * 10 + digit as u32;
        }
        Ok(Self(value))
    }

    /// Decode the 4-byte payload
    ///
    /// Raw payloads are not range-checked; whatever the peer or the store
    /// holds is compared as-is.
    pub fn from_bytes(bytes: [u8; CREDENTIAL_SIZE]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// Encode as the 4-byte payload
    pub fn to_bytes(self) -> [u8; CREDENTIAL_SIZE] {
        self.0.to_le_bytes()
    }

    /// Numeric value
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Incremental decoder for a credential payload arriving byte by byte
#[derive(Debug, Clone, Default)]
pub struct CredentialReader {
    bytes: Vec<u8, CREDENTIAL_SIZE>,
}

impl CredentialReader {
    /// Create an empty reader
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Feed the next payload byte
    ///
    /// Returns the credential once the fourth byte has arrived, after which
    /// the reader is empty again.
    pub fn feed(&mut self, byte: u8) -> Option<Credential> {
        // Capacity is CREDENTIAL_SIZE and the reader drains at that length
        let _ = self.bytes.push(byte);
        if self.bytes.is_full() {
            let mut raw = [0u8; CREDENTIAL_SIZE];
            raw.copy_from_slice(&self.bytes);
            self.bytes.clear();
            return Some(Credential::from_bytes(raw));
        }
        None
    }

    /// Number of payload bytes received so far
    pub fn received(&self) -> usize {
        self.bytes.len()
    }

    /// Drop a partially received payload
    pub fn reset(&mut self) {
        self.bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_payload_is_lsb_first() {
        let cred = Credential::new(12345).unwrap();
        assert_eq!(cred.to_bytes(), [0x39, 0x30, 0x00, 0x00]);
        assert_eq!(Credential::from_bytes([0x31, 0xD4, 0x00, 0x00]).value(), 54321);
    }

    #[test]
    fn test_range() {
        assert!(Credential::new(Credential::MAX).is_ok());
        assert_eq!(
            Credential::new(Credential::MAX + 1),
            Err(CredentialError::OutOfRange)
        );
    }

    #[test]
    fn test_from_digits() {
        assert_eq!(Credential::from_digits(&[1, 2, 3, 4, 5]).unwrap().value(), 12345);
        assert_eq!(Credential::from_digits(&[0, 0, 7]).unwrap().value(), 7);
        assert_eq!(Credential::from_digits(&[]).unwrap().value(), 0);
        assert_eq!(
            Credential::from_digits(&[1, 2, 3, 4, 5, 6]),
            Err(CredentialError::TooManyDigits)
        );
        assert_eq!(
            Credential::from_digits(&[1, 10]),
            Err(CredentialError::InvalidDigit)
        );
    }

    #[test]
    fn test_reader_needs_four_bytes() {
        let mut reader = CredentialReader::new();
        assert_eq!(reader.feed(0x39), None);
        assert_eq!(reader.feed(0x30), None);
        assert_eq!(reader.feed(0x00), None);
        assert_eq!(reader.received(), 3);
        assert_eq!(reader.feed(0x00), Some(Credential::new(12345).unwrap()));
        assert_eq!(reader.received(), 0);
    }

    #[test]
    fn test_reader_reset() {
        let mut reader = CredentialReader::new();
        reader.feed(0xAA);
        reader.feed(0xBB);
        reader.reset();
        for &b in &[0x31, 0xD4, 0x00] {
            assert_eq!(reader.feed(b), None);
        }
        assert_eq!(reader.feed(0x00).map(Credential::value), Some(54321));
    }

    proptest! {
        #[test]
        fn reader_decodes_any_valid_credential(value in 0u32..=Credential::MAX) {
            let cred = Credential::new(value).unwrap();
            let mut reader = CredentialReader::new();
            let mut decoded = None;
            for byte in cred.to_bytes() {
                decoded = reader.feed(byte);
            }
            prop_assert_eq!(decoded, Some(cred));
        }

        #[test]
        fn digits_match_decimal_rendering(value in 0u32..=Credential::MAX) {
            let mut digits = [0u8; MAX_DIGITS];
            let mut rest = value;
            for slot in digits.iter_mut().rev() {
                *slot = (rest % 10) as u8;
                rest /= 10;
            }
            prop_assert_eq!(Credential::from_digits(&digits).unwrap().value(), value);
        }
    }
}
