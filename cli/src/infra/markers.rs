//! Infrastructure implementation of the `MarkerStore` port.
//!
//! `FileMarkerStore` keeps one JSON `CompletionRecord` per step under
//! `<state_dir>/markers/`. Writes go through `tokio::task::spawn_blocking`
//! with an atomic temp file + rename, so a marker that exists is complete.
//! A marker that exists but does not parse is an error, not a pass.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::MarkerStore;
use crate::domain::install::{CompletionRecord, validate_marker_name};

pub struct FileMarkerStore {
    dir: PathBuf,
}

impl FileMarkerStore {
    /// Markers live in `<state_dir>/markers`.
    #[must_use]
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: state_dir.join("markers"),
        }
    }

    fn marker_path(&self, step: &str) -> Result<PathBuf> {
        validate_marker_name(step)?;
        Ok(self.dir.join(format!("{step}.json")))
    }

    /// Read a marker back, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker exists but cannot be read or parsed.
    pub async fn load(&self, step: &str) -> Result<Option<CompletionRecord>> {
        let path = self.marker_path(step)?;
        tokio::task::spawn_blocking(move || Self::load_sync(&path))
            .await
            .context("marker load task panicked")?
    }

    fn load_sync(path: &Path) -> Result<Option<CompletionRecord>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading marker {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("parsing marker {}", path.display()))?;
        Ok(Some(record))
    }

    fn save_sync(path: &Path, record: &CompletionRecord) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(record).context("serializing marker")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("finalizing marker {}", path.display()))
    }
}

impl MarkerStore for FileMarkerStore {
    async fn is_complete(&self, step: &str) -> Result<bool> {
        Ok(self.load(step).await?.is_some())
    }

    async fn mark_complete(&self, step: &str) -> Result<()> {
        let path = self.marker_path(step)?;
        let record = CompletionRecord {
            step: step.to_string(),
            completed_at: Utc::now(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        };
        tokio::task::spawn_blocking(move || Self::save_sync(&path, &record))
            .await
            .context("marker save task panicked")??;
        tracing::debug!(%step, "completion marker written");
        Ok(())
    }
}
