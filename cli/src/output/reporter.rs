//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Forwards progress events to `tracing`, so bootstrap progress lands in the
//! same stream as the structured logs (stderr) and stdout stays free for the
//! followed application log. Messages are plain text; coloring the stream is
//! left to the subscriber.

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Progress reporter honoring the `quiet` flag of an `OutputContext`.
///
/// - `step()` logs `"→ {message}"` at info (suppressed when quiet)
/// - `success()` logs `"✓ {message}"` at info (suppressed when quiet)
/// - `warn()` logs `"⚠ {message}"` at warn (never suppressed)
pub struct TerminalReporter {
    quiet: bool,
}

impl TerminalReporter {
    #[must_use]
    pub fn new(ctx: &OutputContext) -> Self {
        Self { quiet: ctx.quiet }
    }
}

fn step_line(message: &str) -> String {
    format!("→ {message}")
}

fn success_line(message: &str) -> String {
    format!("✓ {message}")
}

fn warn_line(message: &str) -> String {
    format!("⚠ {message}")
}

impl ProgressReporter for TerminalReporter {
    fn step(&self, message: &str) {
        if !self.quiet {
            tracing::info!("{}", step_line(message));
        }
    }

    fn success(&self, message: &str) {
        if !self.quiet {
            tracing::info!("{}", success_line(message));
        }
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", warn_line(message));
    }
}
