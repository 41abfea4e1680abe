//! Character display trait
//!
//! Defines the interface the Interface node renders through.

use crate::progress::{ProgressBar, BAR_GLYPHS};

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with the display controller
    Communication,
    /// Row or column outside the display
    InvalidCoordinates,
    /// Custom glyph slot outside CGRAM
    InvalidGlyph,
}

/// Character LCD
///
/// Rows and columns are 0-based character cells. Writing past the end of a
/// row truncates.
pub trait TextDisplay {
    /// Clear the display and home the cursor
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Write text starting at a cell
    ///
    /// - `row`: Row number (0-based)
    /// - `col`: Column number (0-based)
    /// - `text`: ASCII text; characters 0..=7 select custom glyphs
    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError>;

    /// Program a custom glyph into CGRAM
    ///
    /// - `slot`: Glyph slot (0..=7)
    /// - `pattern`: One byte per pixel row, low 5 bits used
    fn define_glyph(&mut self, slot: u8, pattern: &[u8; 8]) -> Result<(), DisplayError>;

    /// Show the blinking cursor at a cell, or hide it with `None`
    fn set_cursor(&mut self, position: Option<(u8, u8)>) -> Result<(), DisplayError>;

    /// Get the display dimensions
    ///
    /// Returns (columns, rows) in character units
    fn dimensions(&self) -> (u8, u8);
}

impl<T: TextDisplay + ?Sized> TextDisplay for &mut T {
    fn clear(&mut self) -> Result<(), DisplayError> {
        (**self).clear()
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        (**self).write_at(row, col, text)
    }

    fn define_glyph(&mut self, slot: u8, pattern: &[u8; 8]) -> Result<(), DisplayError> {
        (**self).define_glyph(slot, pattern)
    }

    fn set_cursor(&mut self, position: Option<(u8, u8)>) -> Result<(), DisplayError> {
        (**self).set_cursor(position)
    }

    fn dimensions(&self) -> (u8, u8) {
        (**self).dimensions()
    }
}

/// Helper trait for drawing common UI elements
pub trait DisplayExt: TextDisplay {
    /// Draw text horizontally centred on a row
    fn write_centered(&mut self, row: u8, text: &str) -> Result<(), DisplayError> {
        let (cols, _) = self.dimensions();
        let len = u8::try_from(text.len()).unwrap_or(u8::MAX);
        let col = cols.saturating_sub(len) / 2;
        self.write_at(row, col, text)
    }

    /// Clear the screen and show a one- or two-line message
    fn show_message(&mut self, top: &str, bottom: &str) -> Result<(), DisplayError> {
        self.clear()?;
        self.write_centered(0, top)?;
        if !bottom.is_empty() {
            self.write_centered(1, bottom)?;
        }
        Ok(())
    }

    /// Load the progress bar glyphs into CGRAM slots 0..=4
    fn install_bar_glyphs(&mut self) -> Result<(), DisplayError> {
        for (slot, pattern) in BAR_GLYPHS.iter().enumerate() {
            self.define_glyph(slot as u8, pattern)?;
        }
        Ok(())
    }

    /// Draw a full-width progress bar of `current` out of `max` on a row
    fn draw_progress(&mut self, row: u8, max: u16, current: u16) -> Result<(), DisplayError> {
        let (cols, _) = self.dimensions();
        let line = ProgressBar::new(cols).render(max, current);
        self.write_at(row, 0, &line)
    }
}

// Blanket implementation for all TextDisplay types
impl<T: TextDisplay + ?Sized> DisplayExt for T {}
