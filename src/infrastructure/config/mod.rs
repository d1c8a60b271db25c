use crate::domain::error::{AppError, Result};
use crate::domain::loader_config::LoaderConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use validator::Validate;

pub const DEFAULT_CONFIG_FILE: &str = "dataset_loader.toml";
pub const ENV_PREFIX: &str = "DATASET_LOADER_";

/// Layers defaults, the TOML file and `DATASET_LOADER_*` variables, in that order.
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_CONFIG_FILE)
    }

    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<LoaderConfig> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded .env");
        }

        let config: LoaderConfig = Figment::from(Serialized::defaults(LoaderConfig::default()))
            .merge(Toml::file(&self.path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;

        config
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid configuration: {}", e)))?;

        info!(
            path = %self.path.display(),
            cache_enabled = config.cache_enabled,
            cache_ttl_seconds = config.cache_ttl_seconds,
            sources = config.sources.len(),
            "Configuration loaded"
        );

        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
