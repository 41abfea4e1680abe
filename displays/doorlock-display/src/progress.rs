//! Progress bar rendering
//!
//! Each character cell is five pixel columns wide, so a bar advances in
//! fifths of a cell using five custom glyphs: one to four lit columns for
//! the partial cell and a fully lit cell.

use heapless::String;

/// Widest bar that can be rendered (longest HD44780 line)
pub const MAX_BAR_WIDTH: usize = 40;

/// CGRAM patterns for 1..=5 lit pixel columns
pub const BAR_GLYPHS: [[u8; 8]; 5] = [
    [0x10; 8],
    [0x18; 8],
    [0x1C; 8],
    [0x1E; 8],
    [0x1F; 8],
];

/// Glyph slot of the fully lit cell
pub const FULL_CELL: u8 = 4;

const STEPS_PER_CELL: u32 = 5;

/// Horizontal progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProgressBar {
    width: u8,
}

impl ProgressBar {
    /// Bar spanning `width` cells (clamped to [`MAX_BAR_WIDTH`])
    pub fn new(width: u8) -> Self {
        Self {
            width: width.min(MAX_BAR_WIDTH as u8),
        }
    }

    /// Number of lit pixel columns for `current` out of `max`
    ///
    /// Values past `max` render as a full bar, as does a zero `max`.
    pub fn lit_columns(&self, max: u16, current: u16) -> u32 {
        let total = self.width as u32 * STEPS_PER_CELL;
        if max == 0 {
            return total;
        }
        current.min(max) as u32 * total / max as u32
    }

    /// Render the bar as a row of glyph characters padded with spaces
    pub fn render(&self, max: u16, current: u16) -> String<MAX_BAR_WIDTH> {
        let lit = self.lit_columns(max, current);
        let full = lit / STEPS_PER_CELL;
        let partial = lit % STEPS_PER_CELL;

        let mut line = String::new();
        for _ in 0..full {
            let _ = line.push(char::from(FULL_CELL));
        }
        if partial > 0 {
            let _ = line.push(char::from(partial as u8 - 1));
        }
        while line.len() < self.width as usize {
            let _ = line.push(' ');
        }
        line
    }
}
