use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    NotFound(String),
    Network(String),
    MalformedUrl(String),
    Encoding { attempted: Vec<String> },
    SecretNotFound(String),
    SecretStore(String),
    ParseError(String),
    ConfigError(String),
    IoError(String),
    Internal(String),
}

/// Discriminant of [`AppError`], for callers that only branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Network,
    MalformedUrl,
    Encoding,
    SecretNotFound,
    SecretStore,
    Parse,
    Config,
    Io,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Network(_) => ErrorKind::Network,
            AppError::MalformedUrl(_) => ErrorKind::MalformedUrl,
            AppError::Encoding { .. } => ErrorKind::Encoding,
            AppError::SecretNotFound(_) => ErrorKind::SecretNotFound,
            AppError::SecretStore(_) => ErrorKind::SecretStore,
            AppError::ParseError(_) => ErrorKind::Parse,
            AppError::ConfigError(_) => ErrorKind::Config,
            AppError::IoError(_) => ErrorKind::Io,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Secret failures abort the whole batch.
    pub fn is_config_fatal(&self) -> bool {
        matches!(self, AppError::SecretNotFound(_) | AppError::SecretStore(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::MalformedUrl(msg) => write!(f, "Malformed URL: {}", msg),
            AppError::Encoding { attempted } => write!(
                f,
                "Encoding error: no candidate encoding decoded the payload (tried: {})",
                attempted.join(", ")
            ),
            AppError::SecretNotFound(key) => write!(f, "Secret not found: {}", key),
            AppError::SecretStore(msg) => write!(f, "Secret store error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::IoError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
