//! 4x4 key matrix scanner
//!
//! Columns are driven low one at a time while the rows (inputs with
//! pull-ups) are read; a low row means the key at that crossing is held.

use doorlock_core::traits::{Key, Keypad};
use doorlock_hal::gpio::{InputPin, OutputPin};

/// Matrix size
pub const KEYPAD_SIZE: usize = 4;

/// Printed layout of the calculator-style 4x4 pad, indexed `[row][col]`
pub const LAYOUT_4X4: [[char; KEYPAD_SIZE]; KEYPAD_SIZE] = [
    ['7', '8', '9', '/'],
    ['4', '5', '6', '*'],
    ['1', '2', '3', '-'],
    ['C', '0', '=', '+'],
];

/// Scanned key matrix
pub struct MatrixKeypad<R, C> {
    rows: [R; KEYPAD_SIZE],
    cols: [C; KEYPAD_SIZE],
    layout: [[char; KEYPAD_SIZE]; KEYPAD_SIZE],
}

impl<R: InputPin, C: OutputPin> MatrixKeypad<R, C> {
    /// Create a scanner with the standard layout; all columns idle high
    pub fn new(rows: [R; KEYPAD_SIZE], cols: [C; KEYPAD_SIZE]) -> Self {
        Self::with_layout(rows, cols, LAYOUT_4X4)
    }

    /// Create a scanner with a custom printed layout
    pub fn with_layout(
        rows: [R; KEYPAD_SIZE],
        mut cols: [C; KEYPAD_SIZE],
        layout: [[char; KEYPAD_SIZE]; KEYPAD_SIZE],
    ) -> Self {
        for col in cols.iter_mut() {
            col.set_high();
        }
        Self { rows, cols, layout }
    }

    /// Position of the first held key, scanning column by column
    pub fn scan(&mut self) -> Option<(usize, usize)> {
        for c in 0..KEYPAD_SIZE {
            self.cols[c].set_low();
            let row = self.rows.iter().position(|r| r.is_low());
            self.cols[c].set_high();
            if let Some(r) = row {
                return Some((r, c));
            }
        }
        None
    }
}

impl<R: InputPin, C: OutputPin> Keypad for MatrixKeypad<R, C> {
    fn poll(&mut self) -> Option<Key> {
        self.scan().map(|(r, c)| Key::from_char(self.layout[r][c]))
    }
}
