use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Prefix that marks a location string as a secret-store key path.
pub const SECRET_PREFIX: &str = "secret:";

/// Where one dataset lives and how it has to be reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDescriptor {
    LocalPath { path: PathBuf },
    DirectUrl { url: String },
    DriveShareUrl { url: String },
    DropboxShareUrl { url: String },
    SecretRef { key_path: String },
}

impl SourceDescriptor {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        SourceDescriptor::LocalPath { path: path.into() }
    }

    pub fn direct(url: impl Into<String>) -> Self {
        SourceDescriptor::DirectUrl { url: url.into() }
    }

    pub fn drive(url: impl Into<String>) -> Self {
        SourceDescriptor::DriveShareUrl { url: url.into() }
    }

    pub fn dropbox(url: impl Into<String>) -> Self {
        SourceDescriptor::DropboxShareUrl { url: url.into() }
    }

    pub fn secret(key_path: impl Into<String>) -> Self {
        SourceDescriptor::SecretRef {
            key_path: key_path.into(),
        }
    }

    /// Build a descriptor from a raw location string, as found in config files
    /// and secret values. Hosts decide the share-link variants; anything that is
    /// not an http(s) URL is treated as a local path.
    pub fn classify(location: &str) -> Self {
        let location = location.trim();

        if let Some(key_path) = location.strip_prefix(SECRET_PREFIX) {
            return Self::secret(key_path.trim());
        }

        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
                if host == "drive.google.com" || host.ends_with(".drive.google.com") {
                    Self::drive(location)
                } else if host == "dropbox.com" || host.ends_with(".dropbox.com") {
                    Self::dropbox(location)
                } else {
                    Self::direct(location)
                }
            }
            _ => Self::local(location),
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, SourceDescriptor::LocalPath { .. })
    }

    /// Human-readable label used in logs and error reports.
    pub fn label(&self) -> String {
        match self {
            SourceDescriptor::LocalPath { path } => path.display().to_string(),
            SourceDescriptor::DirectUrl { url }
            | SourceDescriptor::DriveShareUrl { url }
            | SourceDescriptor::DropboxShareUrl { url } => url.clone(),
            SourceDescriptor::SecretRef { key_path } => format!("{SECRET_PREFIX}{key_path}"),
        }
    }
}

/// A descriptor after share-link rewriting and secret lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum ResolvedSource {
    Path(PathBuf),
    Url(String),
}

impl ResolvedSource {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ResolvedSource::Path(path) => Some(path),
            ResolvedSource::Url(_) => None,
        }
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            ResolvedSource::Url(url) => Some(url),
            ResolvedSource::Path(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_share_hosts() {
        assert_eq!(
            SourceDescriptor::classify("https://drive.google.com/file/d/abc/view"),
            SourceDescriptor::drive("https://drive.google.com/file/d/abc/view")
        );
        assert_eq!(
            SourceDescriptor::classify("https://www.dropbox.com/s/x/y.csv?dl=0"),
            SourceDescriptor::dropbox("https://www.dropbox.com/s/x/y.csv?dl=0")
        );
        assert_eq!(
            SourceDescriptor::classify("https://raw.githubusercontent.com/u/r/main/a.csv"),
            SourceDescriptor::direct("https://raw.githubusercontent.com/u/r/main/a.csv")
        );
    }

    #[test]
    fn test_classify_paths_and_secrets() {
        assert_eq!(
            SourceDescriptor::classify("data/a.csv"),
            SourceDescriptor::local("data/a.csv")
        );
        assert_eq!(
            SourceDescriptor::classify(r"C:\data\a.csv"),
            SourceDescriptor::local(r"C:\data\a.csv")
        );
        assert_eq!(
            SourceDescriptor::classify("secret: data.sales_url"),
            SourceDescriptor::secret("data.sales_url")
        );
    }

    #[test]
    fn test_descriptor_serde_is_tagged() {
        let json = serde_json::to_string(&SourceDescriptor::secret("k")).unwrap();
        assert_eq!(json, r#"{"kind":"secret_ref","key_path":"k"}"#);
    }
}
