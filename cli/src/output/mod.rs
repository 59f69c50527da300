//! Output formatting module

pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Whether colors are allowed at all: no `--no-color` and no `NO_COLOR`.
fn colors_allowed(no_color: bool) -> bool {
    !no_color && std::env::var_os("NO_COLOR").is_none()
}

/// Whether output written to stderr (including the log stream) may be colored.
#[must_use]
pub fn stderr_colors(no_color: bool) -> bool {
    colors_allowed(no_color) && Term::stderr().is_term()
}

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let mut styles = Styles::default();
        if colors_allowed(no_color) && Term::stdout().is_term() {
            styles.colorize_stdout();
        }
        if stderr_colors(no_color) {
            styles.colorize_stderr();
        }

        Self { styles, quiet }
    }

    /// Print a warning message prefixed with `⚠` to stderr. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Never suppressed: this is
    /// command output, not decoration.
    pub fn kv(&self, key: &str, value: &str) {
        println!("{}={value}", key.style(self.styles.dim));
    }
}
