//! Plugin sources, descriptors, and install mechanisms.
//!
//! Pure functions only: filesystem checks are passed in as closures.

use std::path::{Path, PathBuf};

use crate::domain::error::ConfigError;

// ── Sources ──────────────────────────────────────────────────────────────────

/// Where a plugin is fetched from and the directory it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSource {
    pub url: String,
    pub dir_name: String,
}

impl PluginSource {
    /// Parses `owner/repo` shorthand (resolved against `base`) or a full git URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPluginSource` for empty specs, specs with
    /// whitespace, or shorthand that is not exactly `owner/repo`.
    pub fn parse(spec: &str, base: &str) -> Result<Self, ConfigError> {
        let spec = spec.trim();
        let invalid = || ConfigError::InvalidPluginSource(spec.to_string());
        if spec.is_empty() || spec.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let url = if spec.contains("://") || spec.starts_with("git@") {
            spec.to_string()
        } else {
            let mut parts = spec.split('/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                    format!("{}/{owner}/{repo}.git", base.trim_end_matches('/'))
                }
                _ => return Err(invalid()),
            }
        };

        let dir_name = url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .map(|last| last.trim_end_matches(".git"))
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .ok_or_else(invalid)?
            .to_string();

        Ok(Self { url, dir_name })
    }
}

/// Baseline plugins followed by extra plugins, deduplicated by directory name
/// (first declaration wins).
///
/// # Errors
///
/// Returns the first source that fails to parse.
pub fn plugin_set(
    baseline: &[String],
    extra: &[String],
    base: &str,
) -> Result<Vec<PluginSource>, ConfigError> {
    let mut set: Vec<PluginSource> = Vec::new();
    for spec in baseline.iter().chain(extra) {
        let source = PluginSource::parse(spec, base)?;
        if !set.iter().any(|s| s.dir_name == source.dir_name) {
            set.push(source);
        }
    }
    Ok(set)
}

/// Splits a comma-separated plugin list (as passed through the environment).
#[must_use]
pub fn split_plugin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Directory name used while a fetch is in flight.
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

// ── Install mechanisms ───────────────────────────────────────────────────────

/// Optional install step a plugin directory may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMechanism {
    /// `requirements.txt`: dependency declaration.
    Requirements,
    /// `install.py`: imperative install step.
    InstallScript,
    /// `setup.py`: packaging descriptor, installed in editable mode.
    EditablePackage,
}

impl InstallMechanism {
    /// Fixed application order.
    pub const ORDER: [Self; 3] = [Self::Requirements, Self::InstallScript, Self::EditablePackage];

    /// File whose presence enables the mechanism.
    #[must_use]
    pub fn trigger_file(self) -> &'static str {
        match self {
            Self::Requirements => "requirements.txt",
            Self::InstallScript => "install.py",
            Self::EditablePackage => "setup.py",
        }
    }

    /// Arguments passed to the environment's interpreter, run inside the
    /// plugin directory.
    #[must_use]
    pub fn python_args(self) -> Vec<&'static str> {
        match self {
            Self::Requirements => vec![
                "-m",
                "pip",
                "install",
                "--no-cache-dir",
                "-r",
                "requirements.txt",
            ],
            Self::InstallScript => vec!["install.py"],
            Self::EditablePackage => vec!["-m", "pip", "install", "--no-cache-dir", "-e", "."],
        }
    }
}

impl std::fmt::Display for InstallMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.trigger_file())
    }
}

/// A plugin directory and the mechanisms it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: String,
    pub dir: PathBuf,
    pub mechanisms: Vec<InstallMechanism>,
}

impl PluginDescriptor {
    /// Builds a descriptor; `present` answers whether a file exists in `dir`.
    pub fn detect(dir: &Path, present: impl Fn(&Path) -> bool) -> Self {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mechanisms = InstallMechanism::ORDER
            .into_iter()
            .filter(|m| present(&dir.join(m.trigger_file())))
            .collect();
        Self {
            name,
            dir: dir.to_path_buf(),
            mechanisms,
        }
    }
}

/// Whether a directory under the plugin root takes part in reconciliation.
///
/// In-flight fetches and hidden directories are skipped.
#[must_use]
pub fn is_plugin_dir_name(name: &str) -> bool {
    !name.starts_with('.') && !name.ends_with(".partial")
}

// ── Corrective pins ──────────────────────────────────────────────────────────

/// Interpreter arguments for the corrective pinning step, in order.
///
/// Empty pin lists produce no command.
#[must_use]
pub fn pin_commands(force_no_deps: &[String], normal: &[String]) -> Vec<Vec<String>> {
    let mut commands = Vec::new();
    if !force_no_deps.is_empty() {
        let mut args: Vec<String> = [
            "-m",
            "pip",
            "install",
            "--no-cache-dir",
            "--force-reinstall",
            "--no-deps",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        args.extend(force_no_deps.iter().cloned());
        commands.push(args);
    }
    if !normal.is_empty() {
        let mut args: Vec<String> = ["-m", "pip", "install", "--no-cache-dir"]
            .iter()
            .map(ToString::to_string)
            .collect();
        args.extend(normal.iter().cloned());
        commands.push(args);
    }
    commands
}
