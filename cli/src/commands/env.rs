//! `ignite env`: print the filtered environment snapshot.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, EnvSource};
use crate::domain::env::{EnvFilter, EnvironmentSnapshot};
use crate::infra::env::ProcessEnv;

/// Arguments for the env command.
#[derive(Args)]
pub struct EnvArgs {
    /// Output a JSON object instead of NAME=value lines
    #[arg(long)]
    pub json: bool,
}

/// Capture the snapshot exactly as `boot` would and print it.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn run(app: &AppContext, args: &EnvArgs) -> Result<ExitCode> {
    let config = app.config_store.load()?;
    let filter = EnvFilter::new(&config.env.include)?;
    let capture = EnvironmentSnapshot::capture(ProcessEnv.vars(), &filter);

    for name in &capture.rejected {
        app.output
            .warn(&format!("{name} is not propagated: value contains a newline, NUL, or double quote"));
    }

    if args.json {
        let map: serde_json::Map<String, serde_json::Value> = capture
            .snapshot
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        let json = serde_json::to_string_pretty(&map).context("JSON serialization")?;
        println!("{json}");
    } else {
        for (name, value) in capture.snapshot.iter() {
            app.output.kv(name, value);
        }
    }
    Ok(ExitCode::SUCCESS)
}
