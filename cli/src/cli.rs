//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Container bootstrap for GPU generative-media servers
#[derive(Parser)]
#[command(
    name = "ignite",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "IGNITE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full container start sequence (entrypoint)
    Boot(commands::boot::BootArgs),

    /// Print the main application's effective arguments
    Args(commands::args::ArgsArgs),

    /// Print the environment snapshot that would be propagated
    Env(commands::env::EnvArgs),

    /// Print the effective configuration
    Config,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            config,
            quiet,
            no_color,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            config,
        });
        match command {
            Command::Boot(args) => commands::boot::run(&app, args).await,
            Command::Args(args) => commands::args::run(&app, &args),
            Command::Env(args) => commands::env::run(&app, &args),
            Command::Config => commands::config::run(&app),
            Command::Version => {
                commands::version::run();
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
