//! Screen buffer types
//!
//! Provides an in-memory character display with the geometry of the
//! 16x2 LCD on the Interface node.

use crate::backend::{DisplayError, TextDisplay};

/// Number of character rows
pub const SCREEN_ROWS: usize = 2;

/// Number of character columns
pub const SCREEN_COLS: usize = 16;

/// Number of CGRAM glyph slots
pub const GLYPH_SLOTS: usize = 8;

/// In-memory character display
///
/// Cells hold ASCII bytes; custom glyphs appear as their slot number.
#[derive(Clone)]
pub struct Screen {
    cells: [[u8; SCREEN_COLS]; SCREEN_ROWS],
    glyphs: [Option<[u8; 8]>; GLYPH_SLOTS],
    cursor: Option<(u8, u8)>,
    /// Whether the screen changed since the last `mark_clean`
    dirty: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    /// Create a new blank screen
    pub fn new() -> Self {
        Self {
            cells: [[b' '; SCREEN_COLS]; SCREEN_ROWS],
            glyphs: [None; GLYPH_SLOTS],
            cursor: None,
            dirty: true,
        }
    }

    /// Get the full content of a row, including trailing spaces
    pub fn line(&self, row: usize) -> Option<&str> {
        self.cells
            .get(row)
            .and_then(|cells| core::str::from_utf8(cells).ok())
    }

    /// Get the content of a row with trailing spaces removed
    pub fn text(&self, row: usize) -> &str {
        self.line(row).map(str::trim_end).unwrap_or("")
    }

    /// Check whether any row contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        (0..SCREEN_ROWS).any(|row| self.text(row).contains(needle))
    }

    /// Get the pattern stored in a glyph slot
    pub fn glyph(&self, slot: usize) -> Option<[u8; 8]> {
        self.glyphs.get(slot).copied().flatten()
    }

    /// Current cursor position, if shown
    pub fn cursor(&self) -> Option<(u8, u8)> {
        self.cursor
    }

    /// Check if screen changed since the last render
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark screen as clean (after rendering)
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl TextDisplay for Screen {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.cells = [[b' '; SCREEN_COLS]; SCREEN_ROWS];
        self.dirty = true;
        Ok(())
    }

    fn write_at(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        let row = self
            .cells
            .get_mut(row as usize)
            .ok_or(DisplayError::InvalidCoordinates)?;
        if col as usize >= SCREEN_COLS {
            return Err(DisplayError::InvalidCoordinates);
        }
        for (cell, ch) in row[col as usize..].iter_mut().zip(text.chars()) {
            *cell = if ch.is_ascii() { ch as u8 } else { b'?' };
        }
        self.dirty = true;
        Ok(())
    }

    fn define_glyph(&mut self, slot: u8, pattern: &[u8; 8]) -> Result<(), DisplayError> {
        let entry = self
            .glyphs
            .get_mut(slot as usize)
            .ok_or(DisplayError::InvalidGlyph)?;
        *entry = Some(pattern.map(|row| row & 0x1F));
        Ok(())
    }

    fn set_cursor(&mut self, position: Option<(u8, u8)>) -> Result<(), DisplayError> {
        if let Some((row, col)) = position {
            if row as usize >= SCREEN_ROWS || col as usize >= SCREEN_COLS {
                return Err(DisplayError::InvalidCoordinates);
            }
        }
        self.cursor = position;
        Ok(())
    }

    fn dimensions(&self) -> (u8, u8) {
        (SCREEN_COLS as u8, SCREEN_ROWS as u8)
    }
}

impl core::fmt::Debug for Screen {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries((0..SCREEN_ROWS).map(|row| self.text(row)))
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Screen {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Screen[");
        for row in 0..SCREEN_ROWS {
            if row > 0 {
                defmt::write!(f, ", ");
            }
            defmt::write!(f, "{}", self.text(row));
        }
        defmt::write!(f, "]");
    }
}
