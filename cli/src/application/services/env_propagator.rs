//! Application service: publish the runtime environment to every consumer.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};

use crate::application::ports::{EnvSource, LocalFs, ProgressReporter};
use crate::application::services::append_line_once;
use crate::domain::config::BootConfig;
use crate::domain::env::{EnvFilter, EnvSink, EnvironmentSnapshot, sinks, sourcing_line};

/// What `propagate_environment` wrote.
#[derive(Debug, Clone)]
pub struct PropagationReport {
    pub snapshot: EnvironmentSnapshot,
    /// Matching names left out because no sink could carry them verbatim.
    pub rejected: Vec<String>,
    /// Sinks whose original content was saved to `<path>.bak` on this start.
    pub backed_up: Vec<EnvSink>,
    /// Startup files that received the sourcing line on this start.
    pub rc_updated: Vec<std::path::PathBuf>,
}

/// Capture the filtered environment and write it to the four sinks.
///
/// # Errors
///
/// Returns an error if the filter patterns are invalid or any sink, backup,
/// or startup file cannot be written.
pub fn propagate_environment(
    env: &impl EnvSource,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
) -> Result<PropagationReport> {
    reporter.step("propagating runtime environment...");
    let filter = EnvFilter::new(&config.env.include)?;
    let capture = EnvironmentSnapshot::capture(env.vars(), &filter);
    for name in &capture.rejected {
        tracing::warn!(%name, "skipping variable whose value cannot be written to every sink");
    }

    let mut backed_up = Vec::new();
    for sink in sinks(config) {
        if backup_once(fs, &sink)? {
            backed_up.push(sink.clone());
        }
        if let Some(parent) = sink.path.parent() {
            fs.create_dir_all(parent)?;
        }
        fs.write_atomic(&sink.path, &capture.snapshot.render(sink.quoting), sink.mode)
            .with_context(|| format!("writing {} environment sink {}", sink.kind, sink.path.display()))?;
        tracing::debug!(sink = %sink.kind, path = %sink.path.display(), "environment sink written");
    }

    let line = sourcing_line(&config.env.shell_script);
    let mut rc_updated = Vec::new();
    for rc in config.shell_rc_files() {
        if append_line_once(fs, &rc, &line)
            .with_context(|| format!("updating {}", rc.display()))?
        {
            rc_updated.push(rc);
        }
    }

    reporter.success(&format!(
        "propagated {} variables to {} sinks",
        capture.snapshot.len(),
        sinks(config).len()
    ));
    Ok(PropagationReport {
        snapshot: capture.snapshot,
        rejected: capture.rejected,
        backed_up,
        rc_updated,
    })
}

/// Copy the pre-existing sink to `<path>.bak` unless a backup already exists.
fn backup_once(fs: &impl LocalFs, sink: &EnvSink) -> Result<bool> {
    if !sink.backup || !fs.exists(&sink.path) {
        return Ok(false);
    }
    let backup = sink.backup_path();
    if fs.exists(&backup) {
        return Ok(false);
    }
    fs.copy(&sink.path, &backup)
        .with_context(|| format!("backing up {}", sink.path.display()))?;
    Ok(true)
}
