//! Colored terminal output for CLI commands.
//!
//! Uses `termcolor`. Respects the `NO_COLOR` environment variable.

use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice`: `NO_COLOR` wins, otherwise auto-detect.
pub fn color_choice() -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

/// Styled writer over stdout.
pub struct StyledOutput {
    stdout: StandardStream,
}

impl StyledOutput {
    /// Writer using the environment's color choice.
    pub fn new() -> Self {
        Self {
            stdout: StandardStream::stdout(color_choice()),
        }
    }

    fn styled(&mut self, text: &str, color: Option<Color>, bold: bool) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        self.stdout.set_color(&spec)?;
        write!(self.stdout, "{}", text)?;
        self.stdout.reset()
    }

    /// Bold section header.
    pub fn header(&mut self, text: &str) -> io::Result<()> {
        self.styled(text, None, true)?;
        writeln!(self.stdout)
    }

    /// Indented, dimmed detail line.
    pub fn detail(&mut self, text: &str) -> io::Result<()> {
        write!(self.stdout, "  ")?;
        self.styled(text, Some(Color::Cyan), false)?;
        writeln!(self.stdout)
    }

    /// Green "ok" status line.
    pub fn success(&mut self, text: &str) -> io::Result<()> {
        self.styled("ok", Some(Color::Green), true)?;
        writeln!(self.stdout, ": {}", text)
    }

    /// Red "error" status line.
    pub fn failure(&mut self, text: &str) -> io::Result<()> {
        self.styled("error", Some(Color::Red), true)?;
        writeln!(self.stdout, ": {}", text)
    }

    /// Plain line.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.stdout, "{}", text)
    }
}

impl Default for StyledOutput {
    fn default() -> Self {
        Self::new()
    }
}
