//! Colored terminal output for lowering reports.
//!
//! Uses `termcolor` for cross-platform colored output. Respects the
//! `NO_COLOR` environment variable and the `--color` flag.

use std::io::Write;

use nova_codegen::LowerFailure;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from the CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: &str) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        "always" => ColorChoice::Always,
        "never" => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Styled writer for lowering reports. Reports go to stderr so the module
/// text on stdout stays pipeable.
pub struct StyledOutput {
    stderr: StandardStream,
}

impl StyledOutput {
    /// Create a styled writer with the given color choice.
    pub fn new(choice: ColorChoice) -> Self {
        StyledOutput { stderr: StandardStream::stderr(choice) }
    }

    fn writeln_styled(&mut self, text: &str, color: Color, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_bold(bold);
        let _ = self.stderr.set_color(&spec);
        let _ = writeln!(self.stderr, "{}", text);
        let _ = self.stderr.reset();
    }

    /// Green bold line.
    pub fn success(&mut self, text: &str) {
        self.writeln_styled(text, Color::Green, true);
    }

    /// Red bold line.
    pub fn error(&mut self, text: &str) {
        self.writeln_styled(text, Color::Red, true);
    }

    /// Report every recorded failure, one line per function.
    pub fn report_failures(&mut self, failures: &[LowerFailure]) {
        for failure in failures {
            self.error(&format!("error[{}]: {}", failure.function, failure.error));
        }
    }
}
