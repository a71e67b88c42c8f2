//! # Conveyor Config
//!
//! Configuration management for Conveyor.
//! Supports layered configuration from TOML files and environment variables.

mod app_config;
mod error;
mod loader;

pub use app_config::*;
pub use error::ConfigError;
pub use loader::*;
