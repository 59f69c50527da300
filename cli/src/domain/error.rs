//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while validating a `BootConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port for {service}: {port}")]
    InvalidPort { service: String, port: u16 },

    #[error("Port {port} is assigned to both {first} and {second}")]
    PortConflict {
        port: u16,
        first: String,
        second: String,
    },

    #[error("Invalid environment pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid plugin source '{0}': expected 'owner/repo' or a git URL")]
    InvalidPluginSource(String),

    #[error("Invalid value for {key}: must not be empty")]
    Empty { key: String },
}

// ── Remote access errors ──────────────────────────────────────────────────────

/// Errors related to remote shell identity material.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Public key must look like '<type> <base64>' (got: {0:?})")]
    InvalidPublicKey(String),

    #[error("Unsupported host key type '{0}'")]
    UnsupportedKeyType(String),
}

// ── Install errors ────────────────────────────────────────────────────────────

/// Errors related to the application install and plugin reconciliation.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Invalid marker name '{0}': must match ^[a-z0-9][a-z0-9-]*$")]
    InvalidMarkerName(String),
}

// ── Command errors ────────────────────────────────────────────────────────────

/// An external command exited unsuccessfully.
#[derive(Debug, Error)]
#[error("{program} exited with {status}\n{stderr}")]
pub struct CommandError {
    pub program: String,
    pub status: String,
    pub stderr: String,
}
