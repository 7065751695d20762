//! ANSI color utilities for cachemap terminal reports.
//!
//! Color scheme optimized for both light and dark terminals:
//! - Strategy tags carry the signal: BULK green, SINGLE cyan, DIRECT yellow,
//!   UNSUITABLE dimmed
//! - Variable names bold, function banners bright blue
//! - Everything else plain, so piped output stays readable with --no-color

use owo_colors::{OwoColorize, Style};

use crate::types::AccessStrategy;

/// Display style of a strategy tag.
pub fn strategy_style(strategy: AccessStrategy) -> Style {
    match strategy {
        AccessStrategy::Bulk => Style::new().green().bold(),
        AccessStrategy::Single => Style::new().cyan(),
        AccessStrategy::Direct => Style::new().yellow(),
        AccessStrategy::Unsuitable => Style::new().dimmed(),
    }
}

/// Colorize report fragments, or pass them through untouched when disabled.
#[derive(Debug, Clone, Copy)]
pub struct Colorizer {
    enabled: bool,
}

impl Colorizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Strategy name in its tag color
    pub fn strategy(&self, strategy: AccessStrategy) -> String {
        if self.enabled {
            strategy.name().style(strategy_style(strategy)).to_string()
        } else {
            strategy.name().to_string()
        }
    }

    /// Function / operator banners (bold bright blue)
    pub fn header(&self, s: &str) -> String {
        if self.enabled {
            s.bright_blue().bold().to_string()
        } else {
            s.to_string()
        }
    }

    /// Variable names (bold)
    pub fn variable(&self, s: &str) -> String {
        if self.enabled {
            s.bold().to_string()
        } else {
            s.to_string()
        }
    }

    /// Warnings inside a report (red)
    pub fn warning(&self, s: &str) -> String {
        if self.enabled {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }
}
