//! Terminal colouring.

use owo_colors::OwoColorize;

/// Colours used for removed and added text, or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Default for Palette {
    fn default() -> Self {
        Self::colored()
    }
}

impl Palette {
    /// Create a palette, coloured or plain.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// ANSI colours.
    pub fn colored() -> Self {
        Self::new(true)
    }

    /// No escape sequences.
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Whether escape sequences are emitted.
    pub fn is_colored(self) -> bool {
        self.color
    }

    /// Text of something removed or old.
    pub fn removed(self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Text of something added or new.
    pub fn added(self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }
}
