//! Command implementations

pub mod args;
pub mod boot;
pub mod config;
pub mod env;
pub mod version;
