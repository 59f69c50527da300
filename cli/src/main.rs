//! ignite - container bootstrap for GPU generative-media servers

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ignite_cli::cli::Cli;
use ignite_cli::output::stderr_colors;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(stderr_colors(cli.no_color))
        .init();

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
