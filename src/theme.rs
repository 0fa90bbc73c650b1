//! Terminal color palette
//!
//! Thin facade over `colored` so every command styles its output the same
//! way. Respects NO_COLOR through `colored`'s own detection.

use colored::{ColoredString, Colorize};

pub struct Theme;

impl Theme {
    pub fn header(text: &str) -> ColoredString {
        text.bold().cyan()
    }

    pub fn primary(text: &str) -> ColoredString {
        text.cyan()
    }

    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    pub fn warn(text: &str) -> ColoredString {
        text.yellow()
    }

    pub fn error(text: &str) -> ColoredString {
        text.red().bold()
    }

    pub fn muted(text: &str) -> ColoredString {
        text.dimmed()
    }

    /// Emphasized figures in tables and stat tiles.
    pub fn value(text: &str) -> ColoredString {
        text.bold()
    }

    /// Something the user can type, e.g. a suggested command.
    pub fn command(text: &str) -> ColoredString {
        text.bold().yellow()
    }

    pub fn divider(width: usize) -> String {
        "─".repeat(width)
    }

    pub fn divider_bold(width: usize) -> String {
        "━".repeat(width)
    }
}
