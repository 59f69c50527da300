//! `ignite boot`: the container entrypoint.

use std::process::{ExitCode, ExitStatus};

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::bootstrap::{BootOptions, BootPorts, run_bootstrap};
use crate::domain::plugin::split_plugin_list;
use crate::infra::env::ProcessEnv;
use crate::infra::supervisor::TokioServiceLauncher;
use crate::output::TerminalReporter;

/// Arguments for the boot command.
#[derive(Args)]
pub struct BootArgs {
    /// Public key authorized for the administrative account; a random
    /// password is generated when absent
    #[arg(long, env = "PUBLIC_KEY", value_name = "KEY")]
    pub public_key: Option<String>,

    /// Notebook server token (empty disables authentication)
    #[arg(long, env = "JUPYTER_PASSWORD", default_value = "", hide_env_values = true)]
    pub notebook_token: String,

    /// Extra plugins, comma-separated `owner/repo` or git URLs
    #[arg(long, env = "IGNITE_EXTRA_PLUGINS", default_value = "")]
    pub extra_plugins: String,

    /// Do not provision or start the remote shell daemon
    #[arg(long)]
    pub skip_ssh: bool,

    /// Do not start the file browser or notebook server
    #[arg(long)]
    pub skip_aux: bool,
}

/// Run the start sequence and exit with the main application's status.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a fail-fast stage fails.
pub async fn run(app: &AppContext, args: BootArgs) -> Result<ExitCode> {
    let config = app.config_store.load()?;
    tracing::info!(config = %app.config_store.path().display(), "bootstrap starting");

    let commands = AppContext::command_runner(&config);
    let installs = AppContext::install_runner(&config);
    let markers = AppContext::marker_store(&config);
    let reporter = TerminalReporter::new(&app.output);
    let ports = BootPorts {
        commands: &commands,
        installs: &installs,
        fs: &app.fs,
        markers: &markers,
        launcher: &TokioServiceLauncher,
        env: &ProcessEnv,
        reporter: &reporter,
    };
    let options = BootOptions {
        public_key: args.public_key,
        notebook_token: args.notebook_token,
        extra_plugins: split_plugin_list(&args.extra_plugins),
        skip_ssh: args.skip_ssh,
        skip_aux: args.skip_aux,
    };

    let status = run_bootstrap(&ports, &config, &options).await?;
    Ok(exit_code(status))
}

/// Map the anchor's status to the entrypoint's: its code, or `128 + signal`.
#[must_use]
pub fn exit_code(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    let code = status
        .code()
        .or_else(|| status.signal().map(|s| 128 + s))
        .unwrap_or(1);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
