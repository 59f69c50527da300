//! Application service: the full container start sequence.
//!
//! Runs the five stages strictly in order. Every stage except the auxiliary
//! services is fail-fast; the sequence ends in the main process, whose exit
//! status is returned.

use std::process::ExitStatus;

use anyhow::Result;

use crate::application::ports::{
    CommandRunner, EnvSource, LocalFs, MarkerStore, ProgressReporter, ServiceLauncher,
};
use crate::application::services::aux_services::{AuxOutcome, launch_auxiliary_services};
use crate::application::services::env_propagator::propagate_environment;
use crate::application::services::install_reconciler::reconcile_installation;
use crate::application::services::main_supervisor::supervise_main_process;
use crate::application::services::secret_provisioner::provision_remote_access;
use crate::domain::config::BootConfig;

/// Port implementations used by the sequence.
pub struct BootPorts<'a, C, I, F, M, L, E, R> {
    /// Runner for short commands.
    pub commands: &'a C,
    /// Runner for fetches and package installs (long timeout).
    pub installs: &'a I,
    pub fs: &'a F,
    pub markers: &'a M,
    pub launcher: &'a L,
    pub env: &'a E,
    pub reporter: &'a R,
}

/// Per-start inputs that do not live in the configuration file.
#[derive(Debug, Clone, Default)]
pub struct BootOptions {
    pub public_key: Option<String>,
    pub notebook_token: String,
    pub extra_plugins: Vec<String>,
    pub skip_ssh: bool,
    pub skip_aux: bool,
}

/// Run the start sequence and return the main process exit status.
///
/// # Errors
///
/// Returns the first error raised by a fail-fast stage.
pub async fn run_bootstrap<C, I, F, M, L, E, R>(
    ports: &BootPorts<'_, C, I, F, M, L, E, R>,
    config: &BootConfig,
    options: &BootOptions,
) -> Result<ExitStatus>
where
    C: CommandRunner,
    I: CommandRunner,
    F: LocalFs,
    M: MarkerStore,
    L: ServiceLauncher,
    E: EnvSource,
    R: ProgressReporter,
{
    if options.skip_ssh {
        tracing::info!("remote shell provisioning skipped");
    } else {
        let access = provision_remote_access(
            ports.commands,
            ports.fs,
            ports.reporter,
            config,
            options.public_key.as_deref(),
        )
        .await?;
        tracing::info!(mode = ?access.mode, generated = ?access.generated_keys, "remote access ready");
    }

    let propagated = propagate_environment(ports.env, ports.fs, ports.reporter, config)?;
    tracing::info!(
        variables = propagated.snapshot.len(),
        rejected = propagated.rejected.len(),
        "environment propagated"
    );

    if options.skip_aux {
        tracing::info!("auxiliary services skipped");
    } else {
        let outcomes = launch_auxiliary_services(
            ports.commands,
            ports.fs,
            ports.markers,
            ports.launcher,
            ports.reporter,
            config,
            &options.notebook_token,
        )
        .await;
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, AuxOutcome::Failed { .. }))
            .count();
        tracing::info!(services = outcomes.len(), failed, "auxiliary services processed");
    }

    let report = reconcile_installation(
        ports.installs,
        ports.fs,
        ports.markers,
        ports.reporter,
        config,
        &options.extra_plugins,
    )
    .await?;
    tracing::info!(
        state = ?report.state,
        fetched = report.fetched.len(),
        plugins = report.plugins.len(),
        "installation ready"
    );

    let inherited_path = ports.env.var("PATH").unwrap_or_default();
    supervise_main_process(
        ports.fs,
        ports.launcher,
        ports.reporter,
        config,
        &inherited_path,
    )
    .await
}
