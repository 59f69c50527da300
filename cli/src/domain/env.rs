//! Environment snapshot and the sink table it is published to.
//!
//! Pure functions only. The snapshot is captured once from an iterator of
//! `(name, value)` pairs and rendered into each sink's line format; every
//! format has a matching parser so a published sink can be read back.

use std::collections::BTreeMap;
use std::path::PathBuf;

use regex::RegexSet;

use crate::domain::config::BootConfig;
use crate::domain::error::ConfigError;

// ── Filter ───────────────────────────────────────────────────────────────────

/// Name predicate built from the configured include patterns.
#[derive(Debug, Clone)]
pub struct EnvFilter {
    set: RegexSet,
}

impl EnvFilter {
    /// Compiles the include patterns.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` naming the first pattern that
    /// fails to compile.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        for pattern in patterns {
            regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
        }
        let set = RegexSet::new(patterns).map_err(|e| ConfigError::InvalidPattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;
        Ok(Self { set })
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.set.is_match(name)
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

/// Filtered, immutable view of the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

/// Result of a capture: the snapshot plus names that matched the filter but
/// cannot be written identically to every sink.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub snapshot: EnvironmentSnapshot,
    pub rejected: Vec<String>,
}

impl EnvironmentSnapshot {
    /// Captures every matching variable whose name and value are
    /// representable in all sink formats.
    pub fn capture<I>(vars: I, filter: &EnvFilter) -> Capture
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut snapshot = BTreeMap::new();
        let mut rejected = Vec::new();
        for (name, value) in vars {
            if !filter.matches(&name) {
                continue;
            }
            if is_valid_name(&name) && is_representable(&value) {
                snapshot.insert(name, value);
            } else {
                rejected.push(name);
            }
        }
        rejected.sort();
        Capture {
            snapshot: Self { vars: snapshot },
            rejected,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Renders the whole snapshot in the given line format.
    #[must_use]
    pub fn render(&self, quoting: Quoting) -> String {
        self.iter()
            .map(|(name, value)| format!("{}\n", quoting.render_line(name, value)))
            .collect()
    }
}

/// Shell-identifier check: `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A value is representable when no sink format needs to escape it.
#[must_use]
pub fn is_representable(value: &str) -> bool {
    !value.contains(['\n', '\r', '\0', '"'])
}

// ── Line formats ─────────────────────────────────────────────────────────────

/// Value-quoting rule of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// `NAME="value"`: `/etc/environment`.
    DoubleQuoted,
    /// `NAME DEFAULT="value"`: `pam_env.conf`.
    PamDefault,
    /// `NAME=value`: the remote-shell daemon reads values literally.
    Raw,
    /// `export NAME='value'`: sourced by interactive shells.
    ShellExport,
}

impl Quoting {
    #[must_use]
    pub fn render_line(self, name: &str, value: &str) -> String {
        match self {
            Self::DoubleQuoted => format!("{name}=\"{value}\""),
            Self::PamDefault => format!("{name} DEFAULT=\"{value}\""),
            Self::Raw => format!("{name}={value}"),
            Self::ShellExport => format!("export {name}='{}'", value.replace('\'', r"'\''")),
        }
    }

    /// Parses one line produced by `render_line`. Returns `None` for blank,
    /// comment, or foreign lines.
    #[must_use]
    pub fn parse_line(self, line: &str) -> Option<(String, String)> {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            return None;
        }
        let (name, value) = match self {
            Self::DoubleQuoted => {
                let (name, rest) = line.split_once('=')?;
                (name, rest.strip_prefix('"')?.strip_suffix('"')?.to_string())
            }
            Self::PamDefault => {
                let (name, rest) = line.split_once(" DEFAULT=")?;
                (name, rest.strip_prefix('"')?.strip_suffix('"')?.to_string())
            }
            Self::Raw => {
                let (name, rest) = line.split_once('=')?;
                (name, rest.to_string())
            }
            Self::ShellExport => {
                let (name, rest) = line.strip_prefix("export ")?.split_once('=')?;
                let inner = rest.strip_prefix('\'')?.strip_suffix('\'')?;
                (name, inner.replace(r"'\''", "'"))
            }
        };
        is_valid_name(name).then(|| (name.to_string(), value))
    }
}

/// Parses a whole sink file back into a name → value map.
#[must_use]
pub fn parse_sink(content: &str, quoting: Quoting) -> BTreeMap<String, String> {
    content
        .lines()
        .filter_map(|line| quoting.parse_line(line))
        .collect()
}

// ── Sink table ───────────────────────────────────────────────────────────────

/// Consumer of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    System,
    Pam,
    Session,
    Shell,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::Pam => "pam",
            Self::Session => "session",
            Self::Shell => "shell",
        };
        f.write_str(name)
    }
}

/// One row of the sink table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSink {
    pub kind: SinkKind,
    pub path: PathBuf,
    pub mode: u32,
    pub quoting: Quoting,
    /// Keep a `.bak` copy of the pre-existing file (taken once).
    pub backup: bool,
}

impl EnvSink {
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }
}

/// The four sinks every snapshot is published to.
#[must_use]
pub fn sinks(config: &BootConfig) -> Vec<EnvSink> {
    vec![
        EnvSink {
            kind: SinkKind::System,
            path: config.env.system_file.clone(),
            mode: 0o644,
            quoting: Quoting::DoubleQuoted,
            backup: true,
        },
        EnvSink {
            kind: SinkKind::Pam,
            path: config.env.pam_file.clone(),
            mode: 0o644,
            quoting: Quoting::PamDefault,
            backup: true,
        },
        EnvSink {
            kind: SinkKind::Session,
            path: config.session_env_file(),
            mode: 0o600,
            quoting: Quoting::Raw,
            backup: false,
        },
        EnvSink {
            kind: SinkKind::Shell,
            path: config.env.shell_script.clone(),
            mode: 0o644,
            quoting: Quoting::ShellExport,
            backup: false,
        },
    ]
}

/// Line appended to shell startup files so new sessions see the snapshot.
#[must_use]
pub fn sourcing_line(script: &std::path::Path) -> String {
    format!(". {}", script.display())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
