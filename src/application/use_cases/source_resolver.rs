use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::domain::error::{AppError, Result};
use crate::domain::source::{ResolvedSource, SourceDescriptor};
use crate::infrastructure::security::SecretStore;
use crate::infrastructure::storage::resolve_data_path;

pub const DRIVE_DOWNLOAD_BASE: &str = "https://drive.google.com/uc";

// `/file/d/<id>/view`, `/spreadsheets/d/<id>/edit`, `/d/<id>`
static DRIVE_PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([A-Za-z0-9_-]+)(?:/|$)").unwrap());

static DRIVE_ID_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Rewrites share links into direct-download locations and expands secret references.
pub struct SourceResolver {
    secrets: Arc<dyn SecretStore>,
    data_dir: PathBuf,
}

impl SourceResolver {
    pub fn new(secrets: Arc<dyn SecretStore>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            secrets,
            data_dir: data_dir.into(),
        }
    }

    pub fn resolve(&self, descriptor: &SourceDescriptor) -> Result<ResolvedSource> {
        match descriptor {
            SourceDescriptor::LocalPath { path } => {
                Ok(ResolvedSource::Path(resolve_data_path(&self.data_dir, path)))
            }
            SourceDescriptor::DirectUrl { url } => Ok(ResolvedSource::Url(url.clone())),
            SourceDescriptor::DriveShareUrl { url } => {
                drive_download_url(url).map(ResolvedSource::Url)
            }
            SourceDescriptor::DropboxShareUrl { url } => {
                dropbox_download_url(url).map(ResolvedSource::Url)
            }
            SourceDescriptor::SecretRef { key_path } => self.resolve_secret(key_path),
        }
    }

    fn resolve_secret(&self, key_path: &str) -> Result<ResolvedSource> {
        let value = self
            .secrets
            .lookup(key_path)?
            .ok_or_else(|| AppError::SecretNotFound(key_path.to_string()))?;

        debug!(key_path = %key_path, "Resolved secret reference");

        match SourceDescriptor::classify(&value) {
            SourceDescriptor::SecretRef { .. } => Err(AppError::MalformedUrl(format!(
                "Secret {} points at another secret reference",
                key_path
            ))),
            SourceDescriptor::LocalPath { .. } => Err(AppError::MalformedUrl(format!(
                "Secret {} does not hold an http(s) URL",
                key_path
            ))),
            inner => self.resolve(&inner),
        }
    }
}

/// `https://drive.google.com/file/d/<id>/view` -> `https://drive.google.com/uc?export=download&id=<id>`
pub fn drive_download_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| AppError::MalformedUrl(format!("Cannot parse Drive URL {}: {}", url, e)))?;

    let from_path = DRIVE_PATH_ID
        .captures(parsed.path())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let file_id = from_path
        .or_else(|| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
                .filter(|value| DRIVE_ID_VALUE.is_match(value))
        })
        .ok_or_else(|| {
            AppError::MalformedUrl(format!("No file identifier found in Drive URL {}", url))
        })?;

    Ok(format!(
        "{}?export=download&id={}",
        DRIVE_DOWNLOAD_BASE, file_id
    ))
}

/// Force the `dl=1` download flag on a Dropbox share link.
///
/// A trailing `dl=0` becomes `dl=1` with nothing else touched; a trailing
/// `dl=1` is returned unchanged.
pub fn dropbox_download_url(url: &str) -> Result<String> {
    // Same leading/trailing characters the URL parser drops
    let url = url.trim_matches(|c: char| c.is_ascii_control() || c == ' ');
    let parsed = Url::parse(url)
        .map_err(|e| AppError::MalformedUrl(format!("Cannot parse Dropbox URL {}: {}", url, e)))?;

    let Some(query) = parsed.query().filter(|q| !q.is_empty()) else {
        let base = url.strip_suffix('?').unwrap_or(url);
        return Ok(format!("{}?dl=1", base));
    };

    if parsed.fragment().is_none() {
        match query.rsplit('&').next() {
            Some("dl=0") if url.ends_with("dl=0") => {
                return Ok(format!("{}1", &url[..url.len() - 1]))
            }
            Some("dl=1") if url.ends_with("dl=1") => return Ok(url.to_string()),
            _ => {}
        }
    }

    let mut has_dl = false;
    for (key, value) in parsed.query_pairs() {
        if key == "dl" {
            if value != "0" && value != "1" {
                return Err(AppError::MalformedUrl(format!(
                    "Unexpected dl={} in Dropbox URL {}",
                    value, url
                )));
            }
            has_dl = true;
        }
    }

    if !has_dl {
        let mut rewritten = parsed.clone();
        rewritten.query_pairs_mut().append_pair("dl", "1");
        return Ok(rewritten.to_string());
    }

    // dl appears somewhere other than the end: rebuild the query with dl=1
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "dl" { "1".into() } else { value };
            (key.into_owned(), value.into_owned())
        })
        .collect();
    let mut rewritten = parsed.clone();
    rewritten.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(rewritten.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::infrastructure::security::MapSecretStore;

    fn resolver(store: MapSecretStore) -> SourceResolver {
        SourceResolver::new(Arc::new(store), "")
    }

    #[test]
    fn test_dropbox_dl0_rewritten_in_place() {
        let urls = [
            "https://www.dropbox.com/s/x/y.csv?dl=0",
            "https://www.dropbox.com/scl/fi/abc/file%20name.csv?rlkey=Zz9&dl=0",
            "https://dl.dropbox.com/s/codigo123/arquivo1.csv?raw=1&dl=0",
        ];
        for url in urls {
            let resolved = dropbox_download_url(url).unwrap();
            assert_eq!(resolved.len(), url.len());
            assert_eq!(&resolved[..url.len() - 1], &url[..url.len() - 1]);
            assert!(resolved.ends_with("dl=1"));
        }
    }

    #[test]
    fn test_dropbox_dl1_idempotent() {
        let url = "https://www.dropbox.com/s/x/y.csv?dl=1";
        let once = dropbox_download_url(url).unwrap();
        assert_eq!(once, url);
        assert_eq!(dropbox_download_url(&once).unwrap(), once);
    }

    #[test]
    fn test_dropbox_flag_appended() {
        assert_eq!(
            dropbox_download_url("https://www.dropbox.com/s/x/y.csv").unwrap(),
            "https://www.dropbox.com/s/x/y.csv?dl=1"
        );
        assert_eq!(
            dropbox_download_url("https://www.dropbox.com/scl/fi/x/y.csv?rlkey=k").unwrap(),
            "https://www.dropbox.com/scl/fi/x/y.csv?rlkey=k&dl=1"
        );
        let appended = dropbox_download_url("https://www.dropbox.com/s/x/y.csv").unwrap();
        assert_eq!(dropbox_download_url(&appended).unwrap(), appended);
    }

    #[test]
    fn test_dropbox_dl_in_middle_rewritten() {
        assert_eq!(
            dropbox_download_url("https://www.dropbox.com/s/x/y.csv?dl=0&rlkey=k").unwrap(),
            "https://www.dropbox.com/s/x/y.csv?dl=1&rlkey=k"
        );
    }

    #[test]
    fn test_dropbox_surrounding_whitespace_ignored() {
        let expected = "https://www.dropbox.com/s/x/y.csv?dl=1";
        for url in [
            "https://www.dropbox.com/s/x/y.csv?dl=0 ",
            "https://www.dropbox.com/s/x/y.csv?dl=0\n",
            "  https://www.dropbox.com/s/x/y.csv?dl=0\r\n",
            "https://www.dropbox.com/s/x/y.csv?dl=1\t",
        ] {
            assert_eq!(dropbox_download_url(url).unwrap(), expected);
        }

        let resolved = resolver(MapSecretStore::new())
            .resolve(&SourceDescriptor::dropbox("https://www.dropbox.com/s/x/y.csv?dl=0\n"))
            .unwrap();
        assert_eq!(resolved, ResolvedSource::Url(expected.to_string()));
    }

    #[test]
    fn test_dropbox_malformed() {
        let err = dropbox_download_url("not a url").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedUrl);
        let err = dropbox_download_url("https://www.dropbox.com/s/x/y.csv?dl=yes&a=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedUrl);
    }

    #[test]
    fn test_drive_identifier_extracted() {
        let id = "1AbCdEfGhIjKlMnOpQrStUvWxYz_0123-45";
        let shapes = [
            format!("https://drive.google.com/file/d/{}/view?usp=sharing", id),
            format!("https://drive.google.com/file/d/{}", id),
            format!("https://docs.google.com/spreadsheets/d/{}/edit#gid=0", id),
            format!("https://drive.google.com/open?id={}", id),
            format!("https://drive.google.com/uc?id={}", id),
        ];
        for url in &shapes {
            assert_eq!(
                drive_download_url(url).unwrap(),
                format!("https://drive.google.com/uc?export=download&id={}", id)
            );
        }
    }

    #[test]
    fn test_drive_without_identifier() {
        let err = drive_download_url("https://drive.google.com/drive/my-drive").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedUrl);
    }

    #[test]
    fn test_identity_variants() {
        let r = resolver(MapSecretStore::new());
        assert_eq!(
            r.resolve(&SourceDescriptor::direct("https://example.com/a.csv")).unwrap(),
            ResolvedSource::Url("https://example.com/a.csv".to_string())
        );
        assert_eq!(
            r.resolve(&SourceDescriptor::local("a.csv")).unwrap(),
            ResolvedSource::Path(PathBuf::from("a.csv"))
        );
    }

    #[test]
    fn test_local_paths_joined_to_data_dir() {
        let r = SourceResolver::new(Arc::new(MapSecretStore::new()), "data");
        assert_eq!(
            r.resolve(&SourceDescriptor::local("a.csv")).unwrap(),
            ResolvedSource::Path(PathBuf::from("data").join("a.csv"))
        );
    }

    #[test]
    fn test_secret_resolves_through_share_rewrite() {
        let r = resolver(
            MapSecretStore::new()
                .with("data.sales", "https://www.dropbox.com/s/x/sales.csv?dl=0")
                .with("data.plain", "https://example.com/plain.csv"),
        );
        assert_eq!(
            r.resolve(&SourceDescriptor::secret("data.sales")).unwrap(),
            ResolvedSource::Url("https://www.dropbox.com/s/x/sales.csv?dl=1".to_string())
        );
        assert_eq!(
            r.resolve(&SourceDescriptor::secret("data.plain")).unwrap(),
            ResolvedSource::Url("https://example.com/plain.csv".to_string())
        );
    }

    #[test]
    fn test_secret_errors() {
        let r = resolver(
            MapSecretStore::new()
                .with("loop", "secret:loop")
                .with("path", "data/local.csv"),
        );

        let missing = r.resolve(&SourceDescriptor::secret("absent")).unwrap_err();
        assert_eq!(missing, AppError::SecretNotFound("absent".to_string()));
        assert!(missing.is_config_fatal());

        let looped = r.resolve(&SourceDescriptor::secret("loop")).unwrap_err();
        assert_eq!(looped.kind(), ErrorKind::MalformedUrl);

        let not_url = r.resolve(&SourceDescriptor::secret("path")).unwrap_err();
        assert_eq!(not_url.kind(), ErrorKind::MalformedUrl);
    }
}
