//! Application service: launch and follow the main application.

use std::path::Path;
use std::process::ExitStatus;

use anyhow::{Context, Result};

use crate::application::ports::{LocalFs, ProgressReporter, ServiceLauncher};
use crate::domain::args::{ARGS_FILE_TEMPLATE, compose_arguments, fixed_arguments};
use crate::domain::config::BootConfig;
use crate::domain::service::main_service;

/// Create the argument file with its comment template when it is missing.
/// An existing file is never touched. Returns `true` when it was created.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn ensure_argument_file(fs: &impl LocalFs, path: &Path) -> Result<bool> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.create_new(path, ARGS_FILE_TEMPLATE)
        .with_context(|| format!("creating argument file {}", path.display()))
}

/// Fixed arguments followed by the arguments declared in `path`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn effective_arguments(fs: &impl LocalFs, config: &BootConfig, path: &Path) -> Result<Vec<String>> {
    let content = if fs.exists(path) {
        fs.read_to_string(path)
            .with_context(|| format!("reading argument file {}", path.display()))?
    } else {
        String::new()
    };
    Ok(compose_arguments(
        &fixed_arguments(&config.app.listen, config.app.port),
        &content,
    ))
}

/// Start the main application and follow its log until it exits.
///
/// # Errors
///
/// Returns an error if the argument file cannot be prepared or the process
/// cannot be started. The application's own exit status is returned, not
/// turned into an error.
pub async fn supervise_main_process(
    fs: &impl LocalFs,
    launcher: &impl ServiceLauncher,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
    inherited_path: &str,
) -> Result<ExitStatus> {
    let args_file = config.args_file();
    if ensure_argument_file(fs, &args_file)? {
        tracing::info!(path = %args_file.display(), "created argument file");
    }
    let args = effective_arguments(fs, config, &args_file)?;
    let spec = main_service(config, args, inherited_path);

    reporter.step(&format!("starting {}: {}", spec.name, spec.command_line()));
    let status = launcher
        .run_anchor(&spec)
        .await
        .with_context(|| format!("running {}", spec.name))?;
    if status.success() {
        reporter.success(&format!("{} exited", spec.name));
    } else {
        reporter.warn(&format!("{} exited with {status}", spec.name));
    }
    Ok(status)
}
