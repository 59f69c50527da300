//! Install state decision and completion marker records.
//!
//! This module is intentionally free of I/O: callers gather observations and
//! the decision is a pure function of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::InstallError;

/// Marker written once the isolated runtime environment is created and its
/// package installer bootstrapped.
pub const MARKER_RUNTIME_ENV: &str = "runtime-env";

/// Marker written once the file browser has been configured.
pub const MARKER_FILEBROWSER: &str = "filebrowser";

/// Marker written once the notebook workspace has been initialised.
pub const MARKER_NOTEBOOK: &str = "notebook";

/// Which branch of the installation the current start takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    /// Application root or runtime environment missing: fetch, create,
    /// then reconcile.
    FirstRun,
    /// Everything present: reconcile only.
    SteadyState,
}

/// What the reconciler found on the persistent volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallObservation {
    pub app_present: bool,
    pub env_dir_present: bool,
    /// `<venv>/bin/python` exists.
    pub env_interpreter_present: bool,
    pub env_marker_present: bool,
}

impl InstallObservation {
    /// The runtime environment is usable when its directory exists and either
    /// its creation was recorded or it carries an interpreter.
    #[must_use]
    pub fn env_ready(&self) -> bool {
        self.env_dir_present && (self.env_marker_present || self.env_interpreter_present)
    }

    /// An environment built before markers existed: usable, but unrecorded.
    #[must_use]
    pub fn env_adoptable(&self) -> bool {
        self.env_ready() && !self.env_marker_present
    }

    #[must_use]
    pub fn state(&self) -> InstallState {
        if self.app_present && self.env_ready() {
            InstallState::SteadyState
        } else {
            InstallState::FirstRun
        }
    }
}

/// Content of a completion marker file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionRecord {
    pub step: String,
    pub completed_at: DateTime<Utc>,
    /// Version of the tool that wrote the marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Validates a marker name: lowercase alphanumerics and dashes, no leading dash.
///
/// # Errors
///
/// Returns `InstallError::InvalidMarkerName` otherwise.
pub fn validate_marker_name(name: &str) -> Result<(), InstallError> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(InstallError::InvalidMarkerName(name.to_string()))
    }
}
