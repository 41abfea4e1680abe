//! Keypad password entry
//!
//! Collects up to five digits. `C` erases the last digit, `=` submits
//! early, and the entry completes on its own once every digit is in.

use heapless::Vec;

use doorlock_protocol::{Credential, MAX_DIGITS};

use crate::traits::Key;

/// What a key press did to the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryUpdate {
    /// Digit stored at `position` (0-based column)
    Digit { position: u8, value: u8 },
    /// Digit at `position` removed
    Erased { position: u8 },
    /// `=` pressed; the entry is finished
    Submitted,
    /// Key has no meaning here
    Ignored,
}

/// Password being typed on the keypad
#[derive(Debug, Clone)]
pub struct PasswordEntry {
    digits: Vec<u8, MAX_DIGITS>,
    length: usize,
    submitted: bool,
}

impl PasswordEntry {
    /// Start an entry expecting `length` digits (at most [`MAX_DIGITS`])
    pub fn new(length: u8) -> Self {
        Self {
            digits: Vec::new(),
            length: (length as usize).clamp(1, MAX_DIGITS),
            submitted: false,
        }
    }

    /// Apply one key press
    pub fn feed(&mut self, key: Key) -> EntryUpdate {
        if self.is_complete() {
            return EntryUpdate::Ignored;
        }
        match key {
            Key::Digit(value) if value <= 9 => {
                let position = self.digits.len() as u8;
                // is_complete() above guarantees room
                let _ = self.digits.push(value);
                EntryUpdate::Digit { position, value }
            }
            Key::Clear => match self.digits.pop() {
                Some(_) => EntryUpdate::Erased {
                    position: self.digits.len() as u8,
                },
                None => EntryUpdate::Ignored,
            },
            Key::Enter => {
                self.submitted = true;
                EntryUpdate::Submitted
            }
            _ => EntryUpdate::Ignored,
        }
    }

    /// Check whether the entry is finished (full or submitted)
    pub fn is_complete(&self) -> bool {
        self.submitted || self.digits.len() >= self.length
    }

    /// Digits typed so far
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// Check whether nothing has been typed
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Credential for the digits typed so far
    pub fn credential(&self) -> Credential {
        // Digits are 0..=9 and at most MAX_DIGITS, so this cannot fail
        Credential::from_digits(&self.digits).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(entry: &mut PasswordEntry, keys: &str) {
        for c in keys.chars() {
            entry.feed(Key::from_char(c));
        }
    }

    #[test]
    fn test_completes_after_five_digits() {
        let mut entry = PasswordEntry::new(5);
        type_keys(&mut entry, "1234");
        assert!(!entry.is_complete());
        assert_eq!(
            entry.feed(Key::Digit(5)),
            EntryUpdate::Digit { position: 4, value: 5 }
        );
        assert!(entry.is_complete());
        assert_eq!(entry.credential().value(), 12345);
        assert_eq!(entry.feed(Key::Digit(6)), EntryUpdate::Ignored);
    }

    #[test]
    fn test_backspace() {
        let mut entry = PasswordEntry::new(5);
        type_keys(&mut entry, "129");
        assert_eq!(entry.feed(Key::Clear), EntryUpdate::Erased { position: 2 });
        type_keys(&mut entry, "345");
        assert_eq!(entry.credential().value(), 12345);
    }

    #[test]
    fn test_backspace_on_empty_is_ignored() {
        let mut entry = PasswordEntry::new(5);
        assert_eq!(entry.feed(Key::Clear), EntryUpdate::Ignored);
        assert!(entry.is_empty());
    }

    #[test]
    fn test_early_enter() {
        let mut entry = PasswordEntry::new(5);
        type_keys(&mut entry, "42");
        assert_eq!(entry.feed(Key::Enter), EntryUpdate::Submitted);
        assert!(entry.is_complete());
        assert_eq!(entry.len(), 2);
        assert_eq!(entry.credential().value(), 42);
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut entry = PasswordEntry::new(5);
        assert_eq!(entry.feed(Key::Plus), EntryUpdate::Ignored);
        assert_eq!(entry.feed(Key::Other('*')), EntryUpdate::Ignored);
        assert!(entry.is_empty());
    }
}
