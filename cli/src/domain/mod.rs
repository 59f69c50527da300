//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod args;
pub mod config;
pub mod env;
pub mod error;
pub mod install;
pub mod plugin;
pub mod service;
pub mod ssh;

pub use config::BootConfig;
pub use env::{EnvironmentSnapshot, Quoting, SinkKind};
pub use error::{CommandError, ConfigError, InstallError, SecretError};
pub use install::{InstallObservation, InstallState};
pub use plugin::{InstallMechanism, PluginDescriptor, PluginSource};
pub use service::ServiceSpec;
