//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigError};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CONVEYOR";

/// Loads [`AppConfig`] from layered sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    environment: Option<String>,
    env_prefix: String,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `{config_dir}/default.toml` - Default values
    /// 2. `{config_dir}/{environment}.toml` - Environment-specific overrides
    /// 3. `{config_dir}/local.toml` - Local overrides, not committed
    /// 4. Environment variables with the `CONVEYOR_` prefix, nested keys
    ///    separated by `__` (`CONVEYOR_JOBS__QUEUE__CAPACITY=500`)
    ///
    /// Missing files are skipped; every field has a default.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            environment: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Loader for the default location (`./config`).
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Pins the environment instead of reading `CONVEYOR_ENVIRONMENT`.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Overrides the environment variable prefix.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }

        let environment = self.environment.clone().unwrap_or_else(|| {
            std::env::var(format!("{}_ENVIRONMENT", self.env_prefix))
                .unwrap_or_else(|_| "development".to_string())
        });

        info!(
            environment = %environment,
            config_dir = %self.config_dir.display(),
            "Loading configuration"
        );

        let mut builder = Config::builder().set_default("app.environment", environment.as_str())?;

        for name in ["default", environment.as_str(), "local"] {
            let path = self.config_dir.join(format!("{name}.toml"));
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path.as_path()).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Directory the loader reads from.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

/// Validates the configuration.
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    config.jobs.validate()?;

    if config.observability.log_level.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "observability.log_level must not be empty".to_string(),
        ));
    }

    if config.app.environment == "production"
        && config.server.cors_enabled
        && config.server.cors_origins.iter().any(|o| o == "*")
    {
        warn!("CORS allows any origin in production");
    }

    Ok(())
}
