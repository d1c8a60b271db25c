pub mod application;
pub mod domain;
pub mod infrastructure;

pub use crate::application::{
    consolidate, export_csv, ConsolidationReport, DatasetCache, DatasetLoader, SourceResolver,
};
pub use crate::domain::csv::{CsvRow, Dataset, ParseHints};
pub use crate::domain::error::{AppError, ErrorKind, Result};
pub use crate::domain::load_result::LoadResult;
pub use crate::domain::loader_config::{CacheConfig, LoaderConfig};
pub use crate::domain::source::{ResolvedSource, SourceDescriptor};
pub use crate::infrastructure::config::ConfigService;
pub use crate::infrastructure::security::{KeyringSecretStore, MapSecretStore, SecretStore};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over the `info` default; a second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
