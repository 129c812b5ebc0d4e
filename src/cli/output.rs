//! Colored terminal output for user-facing messages.
//!
//! Diagnostics go through `log`; this is for what the user asked to see.

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{IsTerminal, Write};

/// Writes section headers, progress, success and warning lines.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let color = if std::io::stdout().is_terminal() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            verbose,
            quiet,
            color,
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Only printed with `-v`.
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if self.verbose && !self.quiet {
            self.line(None, false, message)?;
        }
        Ok(())
    }

    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.line(Some(Color::Cyan), false, message)
    }

    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.line(Some(Color::Green), true, message)
    }

    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.err_line(Color::Yellow, message)
    }

    /// Always printed, to stderr.
    pub fn error(&self, message: &str) -> std::io::Result<()> {
        self.err_line(Color::Red, message)
    }

    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = StandardStream::stdout(self.color);
        writeln!(out)?;
        out.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(out, "{title}")?;
        out.reset()
    }

    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut out = StandardStream::stdout(self.color);
        writeln!(out, "   {message}")
    }

    /// Plain stdout text, even when quiet.
    pub fn plain(&self, message: &str) -> std::io::Result<()> {
        let mut out = StandardStream::stdout(self.color);
        write!(out, "{message}")?;
        out.flush()
    }

    fn line(&self, color: Option<Color>, bold: bool, message: &str) -> std::io::Result<()> {
        let mut out = StandardStream::stdout(self.color);
        out.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
        writeln!(out, "{message}")?;
        out.reset()
    }

    fn err_line(&self, color: Color, message: &str) -> std::io::Result<()> {
        let mut out = StandardStream::stderr(self.color);
        out.set_color(ColorSpec::new().set_fg(Some(color)))?;
        writeln!(out, "{message}")?;
        out.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_output_still_reports_errors() {
        let output = OutputManager::new(true, true);
        assert!(output.is_verbose());
        output.verbose("hidden").unwrap();
        output.progress("hidden").unwrap();
        output.section("hidden").unwrap();
        output.error("shown").unwrap();
    }
}
