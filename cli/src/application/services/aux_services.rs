//! Application service: auxiliary services (file browser, notebook).
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Nothing here is fatal: every failure is reported as a warning and the
//! bootstrap continues with the next service.

use anyhow::{Context, Result};

use crate::application::ports::{
    CommandRunner, LocalFs, MarkerStore, ProgressReporter, ServiceLauncher,
};
use crate::application::services::check_output;
use crate::domain::config::BootConfig;
use crate::domain::install::{MARKER_FILEBROWSER, MARKER_NOTEBOOK};
use crate::domain::service::{filebrowser_service, filebrowser_setup, notebook_service};

/// Per-service result of `launch_auxiliary_services`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuxOutcome {
    Launched {
        name: String,
        pid: u32,
        configured: bool,
    },
    Disabled {
        name: String,
    },
    Failed {
        name: String,
        error: String,
    },
}

impl AuxOutcome {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Launched { name, .. } | Self::Disabled { name } | Self::Failed { name, .. } => {
                name
            }
        }
    }
}

/// Configure (once) and launch the file browser and the notebook server.
///
/// Never fails; the outcome of each service is returned for reporting.
pub async fn launch_auxiliary_services(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    markers: &impl MarkerStore,
    launcher: &impl ServiceLauncher,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
    notebook_token: &str,
) -> Vec<AuxOutcome> {
    let mut outcomes = Vec::with_capacity(2);

    let name = "filebrowser".to_string();
    outcomes.push(if config.services.filebrowser.enabled {
        settle(
            reporter,
            name,
            launch_filebrowser(runner, fs, markers, launcher, reporter, config).await,
        )
    } else {
        AuxOutcome::Disabled { name }
    });

    let name = "notebook".to_string();
    outcomes.push(if config.services.notebook.enabled {
        settle(
            reporter,
            name,
            launch_notebook(fs, markers, launcher, reporter, config, notebook_token).await,
        )
    } else {
        AuxOutcome::Disabled { name }
    });

    outcomes
}

fn settle(
    reporter: &impl ProgressReporter,
    name: String,
    result: Result<(u32, bool)>,
) -> AuxOutcome {
    match result {
        Ok((pid, configured)) => {
            reporter.success(&format!("{name} started (pid {pid})"));
            AuxOutcome::Launched {
                name,
                pid,
                configured,
            }
        }
        Err(e) => {
            reporter.warn(&format!("{name} not started: {e:#}"));
            AuxOutcome::Failed {
                name,
                error: format!("{e:#}"),
            }
        }
    }
}

async fn launch_filebrowser(
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    markers: &impl MarkerStore,
    launcher: &impl ServiceLauncher,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
) -> Result<(u32, bool)> {
    let mut configured = false;

    if !markers.is_complete(MARKER_FILEBROWSER).await? {
        let db = config.filebrowser_db();
        if fs.exists(&db) {
            // Holds accounts and settings from an earlier start.
            tracing::info!(db = %db.display(), "adopting existing file browser database");
        } else {
            reporter.step("configuring file browser...");
            if let Some(parent) = db.parent() {
                fs.create_dir_all(parent)?;
            }
            if let Err(e) = configure_filebrowser(runner, config).await {
                // Only this run's database; the next start configures from scratch.
                let cleanup = if fs.exists(&db) { fs.remove_file(&db) } else { Ok(()) };
                if let Err(rm) = cleanup {
                    tracing::warn!(db = %db.display(), error = %rm, "cannot remove partial file browser database");
                }
                return Err(e);
            }
            configured = true;
        }
        markers.mark_complete(MARKER_FILEBROWSER).await?;
    }

    let spec = filebrowser_service(config);
    fs.create_dir_all(&config.paths.log_dir)?;
    let pid = launcher.launch(&spec)?;
    tracing::info!(service = %spec.name, pid, log = %spec.log.display(), "auxiliary service launched");
    Ok((pid, configured))
}

async fn configure_filebrowser(runner: &impl CommandRunner, config: &BootConfig) -> Result<()> {
    let program = &config.services.filebrowser.program;
    for args in filebrowser_setup(config) {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = runner
            .run(program, &args)
            .await
            .with_context(|| format!("{program} {}", args.join(" ")))?;
        check_output(&output, program)?;
    }
    Ok(())
}

async fn launch_notebook(
    fs: &impl LocalFs,
    markers: &impl MarkerStore,
    launcher: &impl ServiceLauncher,
    reporter: &impl ProgressReporter,
    config: &BootConfig,
    token: &str,
) -> Result<(u32, bool)> {
    let mut configured = false;
    if !markers.is_complete(MARKER_NOTEBOOK).await? {
        reporter.step("initialising notebook workspace...");
        fs.create_dir_all(&config.paths.workspace_root)?;
        markers.mark_complete(MARKER_NOTEBOOK).await?;
        configured = true;
    }
    if token.is_empty() {
        tracing::warn!("notebook token is empty; the notebook server accepts unauthenticated requests");
    }

    let spec = notebook_service(config, token);
    fs.create_dir_all(&config.paths.log_dir)?;
    let pid = launcher.launch(&spec)?;
    tracing::info!(service = %spec.name, pid, log = %spec.log.display(), "auxiliary service launched");
    Ok((pid, configured))
}
