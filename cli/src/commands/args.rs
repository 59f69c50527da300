//! `ignite args`: print the main application's composed argument list.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::main_supervisor::effective_arguments;

/// Arguments for the args command.
#[derive(Args)]
pub struct ArgsArgs {
    /// Read this argument file instead of the configured one
    #[arg(long, value_name = "PATH")]
    pub args_file: Option<PathBuf>,
}

/// Print the effective arguments on one line, separated by spaces.
///
/// # Errors
///
/// Returns an error if the configuration or the argument file cannot be read.
pub fn run(app: &AppContext, args: &ArgsArgs) -> Result<ExitCode> {
    let config = app.config_store.load()?;
    let path = args.args_file.clone().unwrap_or_else(|| config.args_file());
    let composed = effective_arguments(&app.fs, &config, &path)?;
    println!("{}", composed.join(" "));
    Ok(ExitCode::SUCCESS)
}
