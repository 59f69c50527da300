//! `ignite config`: print the effective configuration.

use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::ports::ConfigStore;

/// Print the configuration, after defaults and validation, as YAML.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or serialized.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.config_store.load()?;
    let yaml = serde_yaml::to_string(&config).context("cannot serialize config")?;
    app.output
        .header(&format!("# {}", app.config_store.path().display()));
    print!("{yaml}");
    Ok(ExitCode::SUCCESS)
}
