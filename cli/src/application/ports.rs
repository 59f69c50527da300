//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

use anyhow::Result;

use crate::domain::ServiceSpec;
use crate::domain::config::BootConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// runner's timeout. A non-zero exit is NOT an error at this level.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with `dir` as its working directory.
    async fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── State and Filesystem Ports ────────────────────────────────────────────────

/// Abstracts completion markers for one-time steps.
#[allow(async_fn_in_trait)]
pub trait MarkerStore {
    /// Whether `step` was recorded as fully completed.
    async fn is_complete(&self, step: &str) -> Result<bool>;
    /// Record `step` as fully completed.
    async fn mark_complete(&self, step: &str) -> Result<()>;
}

/// Abstracts raw filesystem operations used by the services.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Write `content` via a temp file and rename, then apply `mode`.
    fn write_atomic(&self, path: &Path, content: &str, mode: u32) -> Result<()>;
    /// Create the file if missing and create-only: never truncates.
    fn create_new(&self, path: &Path, content: &str) -> Result<bool>;
    /// Append `content` to the file, creating it if missing.
    fn append(&self, path: &Path, content: &str) -> Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    /// Names of the directories directly under `path`, sorted.
    fn list_dirs(&self, path: &Path) -> Result<Vec<String>>;
}

// ── Process Ports ─────────────────────────────────────────────────────────────

/// Starts services as independent processes.
#[allow(async_fn_in_trait)]
pub trait ServiceLauncher {
    /// Start a detached service with output redirected to its log file and
    /// return its pid. The service is never monitored afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be opened or the process
    /// cannot be spawned.
    fn launch(&self, spec: &ServiceSpec) -> Result<u32>;

    /// Start the anchor service and follow its log to stdout until the
    /// process exits. Returns the anchor's exit status.
    async fn run_anchor(&self, spec: &ServiceSpec) -> Result<ExitStatus>;
}

/// Source of the process environment.
pub trait EnvSource {
    /// All variables with UTF-8 names and values.
    fn vars(&self) -> Vec<(String, String)>;
    /// A single variable, if set and UTF-8.
    fn var(&self, name: &str) -> Option<String>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading of the bootstrap configuration.
pub trait ConfigStore {
    /// Load the configuration, returning defaults if no file exists.
    fn load(&self) -> Result<BootConfig>;
    /// Path of the configuration file.
    fn path(&self) -> PathBuf;
}
