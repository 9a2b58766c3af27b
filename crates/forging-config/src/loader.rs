//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use forging_core::ForgingError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Environment variable selecting the environment-specific config file.
pub const ENVIRONMENT_VAR: &str = "FORGING_ENVIRONMENT";

/// Prefix for environment variable overrides, e.g. `FORGING__DATABASE__URL`.
pub const ENV_PREFIX: &str = "FORGING";

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `FORGING__` prefix
    ///
    /// # Errors
    ///
    /// Returns `ForgingError::Configuration` if a source cannot be read or
    /// the merged configuration fails validation.
    pub fn new(config_dir: impl Into<String>) -> Result<Self, ForgingError> {
        let config_dir = config_dir.into();
        let config = Self::load(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::new`].
    pub fn from_default_location() -> Result<Self, ForgingError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    ///
    /// The previous configuration stays in place if the reload fails.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::new`].
    pub async fn reload(&self) -> Result<(), ForgingError> {
        let new_config = Self::load(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads and validates configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::new`].
    pub fn load(config_dir: &str) -> Result<AppConfig, ForgingError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error_to_forging_error)?;

        ConfigValidator::validate(&app_config)
            .map_err(|errors| ForgingError::Configuration(format_validation_errors(&errors)))?;

        Ok(app_config)
    }

    /// Gets a specific configuration value by dotted key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_forging_error(err: ConfigError) -> ForgingError {
    ForgingError::Configuration(err.to_string())
}
