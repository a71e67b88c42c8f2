//! Configuration errors.

use conveyor_jobs::JobError;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values loaded fine but are not usable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<JobError> for ConfigError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Configuration(msg) => Self::Invalid(msg),
            other => Self::Invalid(other.to_string()),
        }
    }
}
