use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SOURCE_COLUMN: &str = "source_file";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoaderConfig {
    pub cache_enabled: bool,
    #[validate(range(min = 1))]
    pub cache_ttl_seconds: u64,
    #[validate(range(min = 1))]
    pub cache_max_entries: usize,
    /// Load `sources` as soon as the loader is asked for its configured data.
    pub auto_load: bool,
    /// Extra encodings tried after utf-8 and latin-1.
    pub encoding_fallbacks: Vec<String>,
    #[validate(range(min = 1, max = 600))]
    pub http_timeout_secs: u64,
    /// Base directory for relative local paths and folder discovery.
    pub data_dir: PathBuf,
    /// Location strings (paths, URLs, `secret:` keys) loaded by auto-load.
    pub sources: Vec<String>,
    /// Provenance column added on consolidation; `None` disables tagging.
    pub source_column: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECS,
            cache_max_entries: 64,
            auto_load: true,
            encoding_fallbacks: Vec::new(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            data_dir: PathBuf::from("data"),
            sources: Vec::new(),
            source_column: Some(DEFAULT_SOURCE_COLUMN.to_string()),
        }
    }
}

/// Per-call caching switch for `load_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn enabled(ttl_secs: u64) -> Self {
        Self {
            enabled: true,
            ttl_secs,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ttl_secs: 0,
        }
    }
}

impl From<&LoaderConfig> for CacheConfig {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            enabled: config.cache_enabled,
            ttl_secs: config.cache_ttl_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoaderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(CacheConfig::from(&config), CacheConfig::enabled(3600));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = LoaderConfig {
            http_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
