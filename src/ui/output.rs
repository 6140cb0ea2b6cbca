//! Colored line output

use colored::{Color, Colorize};
use std::env;
use std::io::{self, Write};

/// Fallback width when the terminal size is unknown
const DEFAULT_WIDTH: usize = 80;

/// Severity of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Pass,
    Warning,
    FixRequired,
}

impl Severity {
    /// Fixed textual marker for this severity
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Pass => "[✔]",
            Severity::Warning => "[~]",
            Severity::FixRequired => "[✘]",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Severity::Pass => Color::Green,
            Severity::Warning => Color::Yellow,
            Severity::FixRequired => Color::Red,
        }
    }
}

/// Write one colored line
pub fn print_colored_to<W: Write + ?Sized>(w: &mut W, color: Color, message: &str) -> io::Result<()> {
    writeln!(w, "{}", message.color(color))
}

/// Write a severity line: marker, space, message
pub fn print_status_to<W: Write + ?Sized>(
    w: &mut W,
    severity: Severity,
    message: &str,
) -> io::Result<()> {
    print_colored_to(w, severity.color(), &format!("{} {}", severity.marker(), message))
}

/// Width used for separators, from `COLUMNS` when set
pub fn terminal_width() -> usize {
    env::var("COLUMNS")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Write a separator line spanning the terminal width
pub fn print_wide_line_to<W: Write + ?Sized>(w: &mut W, fill: char) -> io::Result<()> {
    writeln!(w, "{}", fill.to_string().repeat(terminal_width()))
}
