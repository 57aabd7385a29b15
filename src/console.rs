use std::{fmt, io};

use colored::{ColoredString, Colorize};

/// Tone of an output line, rendered as a colored marker in brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

impl Tone {
    pub fn marker(self) -> ColoredString {
        match self {
            Tone::Info => "o".blue().bold(),
            Tone::Success => "✓".green().bold(),
            Tone::Warning => "!".yellow().bold(),
            Tone::Error => "!".red().bold(),
        }
    }
}

/// Writes a marker-prefixed line to `out`, the same shape the `info!` family
/// of macros prints to stdout.
pub fn line<W: io::Write>(out: &mut W, tone: Tone, args: fmt::Arguments<'_>) -> io::Result<()> {
    writeln!(out, "[{}] {}", tone.marker(), args)
}
