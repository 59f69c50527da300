//! Infrastructure implementation of the `ConfigStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::config::BootConfig;

/// Default location of the configuration file inside the image.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ignite/config.yaml";

/// Production implementation of `ConfigStore` that reads a YAML file.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// `path` overrides the default location (from `--config` / `IGNITE_CONFIG`).
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<BootConfig> {
        let mut config = if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("cannot read {}", self.path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("cannot parse {}", self.path.display()))?
        } else {
            tracing::debug!(path = %self.path.display(), "no config file, using defaults");
            BootConfig::default()
        };
        if config.paths.home.is_none() {
            config.paths.home = dirs::home_dir();
        }
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", self.path.display()))?;
        Ok(config)
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}
