//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`: never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod aux_services;
pub mod bootstrap;
pub mod env_propagator;
pub mod install_reconciler;
pub mod main_supervisor;
pub mod secret_provisioner;

use std::path::Path;
use std::process::Output;

use anyhow::Result;

use crate::application::ports::LocalFs;
use crate::domain::CommandError;

/// Turn a non-zero exit into a `CommandError` carrying the captured stderr.
pub(crate) fn check_output(output: &Output, program: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(CommandError {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
    .into())
}

/// Append `line` to `path` unless an identical line is already present.
/// Returns `true` when the file changed.
pub(crate) fn append_line_once(fs: &impl LocalFs, path: &Path, line: &str) -> Result<bool> {
    let existing = if fs.exists(path) {
        fs.read_to_string(path)?
    } else {
        String::new()
    };
    if existing.lines().any(|l| l.trim() == line) {
        return Ok(false);
    }
    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    fs.append(path, &format!("{separator}{line}\n"))?;
    Ok(true)
}
