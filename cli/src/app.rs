//! Application context: unified state passed to every command handler.
//!
//! Adding a new cross-cutting concern requires only one field change here;
//! command signatures stay the same.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::config::BootConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::fs::LocalFs;
use crate::infra::markers::FileMarkerStore;
use crate::output::OutputContext;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress progress output.
    pub quiet: bool,
    /// Configuration file override.
    pub config: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Configuration file loader.
    pub config_store: YamlConfigStore,
    /// Local filesystem.
    pub fs: LocalFs,
}

impl AppContext {
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            config_store: YamlConfigStore::new(flags.config.clone()),
            fs: LocalFs,
        }
    }

    /// Runner for short commands, bounded by `timeouts.command_secs`.
    #[must_use]
    pub fn command_runner(config: &BootConfig) -> TokioCommandRunner {
        TokioCommandRunner::new(Duration::from_secs(config.timeouts.command_secs))
    }

    /// Runner for fetches and package installs, bounded by `timeouts.install_secs`.
    #[must_use]
    pub fn install_runner(config: &BootConfig) -> TokioCommandRunner {
        TokioCommandRunner::new(Duration::from_secs(config.timeouts.install_secs))
    }

    /// Completion markers under the configured state directory.
    #[must_use]
    pub fn marker_store(config: &BootConfig) -> FileMarkerStore {
        FileMarkerStore::new(&config.state_dir())
    }
}
