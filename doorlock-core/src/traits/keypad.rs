//! Keypad trait

/// Decoded key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Digit 0-9
    Digit(u8),
    /// `C`: erase the last digit
    Clear,
    /// `=`: submit the entry
    Enter,
    /// `+`: open door
    Plus,
    /// `-`: change password
    Minus,
    /// Any other key on the pad (`*`, `/`, ...)
    Other(char),
}

impl Key {
    /// Decode the character printed on a key
    pub fn from_char(c: char) -> Self {
        match c {
            '0'..='9' => Key::Digit(c as u8 - b'0'),
            'C' | 'c' => Key::Clear,
            '=' => Key::Enter,
            '+' => Key::Plus,
            '-' => Key::Minus,
            other => Key::Other(other),
        }
    }

    /// Character printed on the key
    pub fn to_char(self) -> char {
        match self {
            Key::Digit(d) => char::from(b'0' + d.min(9)),
            Key::Clear => 'C',
            Key::Enter => '=',
            Key::Plus => '+',
            Key::Minus => '-',
            Key::Other(c) => c,
        }
    }
}

/// Key matrix scanner
pub trait Keypad {
    /// Return the key currently held, if any
    ///
    /// Never blocks. The caller enforces press-time spacing between reads.
    fn poll(&mut self) -> Option<Key>;
}

impl<T: Keypad + ?Sized> Keypad for &mut T {
    fn poll(&mut self) -> Option<Key> {
        (**self).poll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_decoding() {
        assert_eq!(Key::from_char('7'), Key::Digit(7));
        assert_eq!(Key::from_char('C'), Key::Clear);
        assert_eq!(Key::from_char('='), Key::Enter);
        assert_eq!(Key::from_char('+'), Key::Plus);
        assert_eq!(Key::from_char('-'), Key::Minus);
        assert_eq!(Key::from_char('*'), Key::Other('*'));
    }

    #[test]
    fn test_key_chars() {
        for c in "0123456789C=+-*/".chars() {
            assert_eq!(Key::from_char(c).to_char(), c);
        }
    }
}
