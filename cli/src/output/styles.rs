//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

/// Centralized stylesheet for CLI output colors.
///
/// Styles for stdout and stderr are enabled separately, since either stream
/// may be redirected on its own.
#[derive(Default, Clone)]
pub struct Styles {
    /// Warning prefix on stderr (yellow)
    pub warning: Style,
    /// Dimmed/secondary text on stdout
    pub dim: Style,
    /// Headers/section titles on stdout
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stdout styles.
    pub fn colorize_stdout(&mut self) {
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
    }

    /// Apply colors to the stderr styles.
    pub fn colorize_stderr(&mut self) {
        self.warning = Style::new().yellow();
    }
}
