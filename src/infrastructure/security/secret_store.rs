use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::keyring::KeyringManager;
use crate::domain::error::{AppError, Result};

/// Read-only key-path lookup, populated by the hosting platform before loading.
///
/// `Ok(None)` means the key is absent. `Err` means the store could not be
/// reached at all.
pub trait SecretStore: Send + Sync {
    fn lookup(&self, key_path: &str) -> Result<Option<String>>;
}

/// In-memory secrets, typically read from a platform `secrets.toml`.
/// Nested tables become dotted key paths (`[data] url = ".."` -> `data.url`).
#[derive(Debug, Clone, Default)]
pub struct MapSecretStore {
    values: HashMap<String, String>,
}

impl MapSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key_path: &str, value: &str) -> Self {
        self.values.insert(key_path.to_string(), value.to_string());
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = content
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid secrets file: {}", e)))?;

        let mut values = HashMap::new();
        flatten_table("", &table, &mut values);
        debug!(keys = values.len(), "Loaded secrets");

        Ok(Self { values })
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::SecretStore(format!(
                "Failed to read secrets file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten_table(&path, inner, out),
            toml::Value::String(s) => {
                out.insert(path, s.clone());
            }
            other => {
                out.insert(path, other.to_string());
            }
        }
    }
}

impl SecretStore for MapSecretStore {
    fn lookup(&self, key_path: &str) -> Result<Option<String>> {
        Ok(self.values.get(key_path).cloned())
    }
}

/// Secrets kept in the OS keyring under one service name.
pub struct KeyringSecretStore {
    keyring: KeyringManager,
}

impl KeyringSecretStore {
    pub fn new(service: &str) -> Self {
        Self {
            keyring: KeyringManager::new(service),
        }
    }
}

impl SecretStore for KeyringSecretStore {
    fn lookup(&self, key_path: &str) -> Result<Option<String>> {
        self.keyring.get_secret(key_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_tables_flattened() {
        let store = MapSecretStore::from_toml_str(
            r#"
            token = "abc"

            [data]
            sales_url = "https://example.com/sales.csv"

            [data.archive]
            year = 2023
            "#,
        )
        .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(
            store.lookup("data.sales_url").unwrap().as_deref(),
            Some("https://example.com/sales.csv")
        );
        assert_eq!(store.lookup("data.archive.year").unwrap().as_deref(), Some("2023"));
        assert_eq!(store.lookup("data.missing").unwrap(), None);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(MapSecretStore::from_toml_str("not = [valid").is_err());
    }

    #[test]
    fn test_missing_file_is_store_error() {
        let err = MapSecretStore::from_toml_file(Path::new("/no/such/secrets.toml")).unwrap_err();
        assert!(err.is_config_fatal());
    }
}
