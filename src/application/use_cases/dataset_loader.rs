// ============================================================
// DATASET LOADER USE CASE
// ============================================================
// Resolve, fetch, decode and parse every descriptor of a batch

use futures::future::join_all;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::consolidation::{consolidate, ConsolidationReport};
use super::dataset_cache::DatasetCache;
use super::source_resolver::SourceResolver;
use crate::domain::csv::{Dataset, ParseHints};
use crate::domain::error::{AppError, Result};
use crate::domain::load_result::LoadResult;
use crate::domain::loader_config::{CacheConfig, LoaderConfig};
use crate::domain::source::{ResolvedSource, SourceDescriptor};
use crate::infrastructure::csv::parse_table;
use crate::infrastructure::fetchers::{ByteFetcher, RouterFetcher};
use crate::infrastructure::security::SecretStore;
use crate::infrastructure::storage::discover_csv_files;

/// One descriptor after resolution. Serialized as part of the cache fingerprint.
#[derive(Debug, Clone, Serialize)]
struct Resolution {
    descriptor: SourceDescriptor,
    resolved: std::result::Result<ResolvedSource, AppError>,
}

pub struct DatasetLoader {
    config: LoaderConfig,
    resolver: SourceResolver,
    fetcher: Arc<dyn ByteFetcher>,
    cache: Arc<DatasetCache>,
    hints: ParseHints,
}

impl DatasetLoader {
    pub fn new(config: LoaderConfig, secrets: Arc<dyn SecretStore>) -> Result<Self> {
        let fetcher = Arc::new(RouterFetcher::new(config.http_timeout_secs)?);
        let cache = Arc::new(DatasetCache::new(config.cache_max_entries));
        Ok(Self::with_parts(config, secrets, fetcher, cache))
    }

    /// Build with an explicit fetcher and cache (shared caches, test doubles).
    pub fn with_parts(
        config: LoaderConfig,
        secrets: Arc<dyn SecretStore>,
        fetcher: Arc<dyn ByteFetcher>,
        cache: Arc<DatasetCache>,
    ) -> Self {
        let hints = ParseHints::default().with_fallbacks(&config.encoding_fallbacks);
        let resolver = SourceResolver::new(secrets, config.data_dir.clone());
        Self {
            config,
            resolver,
            fetcher,
            cache,
            hints,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    pub fn hints(&self) -> &ParseHints {
        &self.hints
    }

    pub fn resolve(&self, descriptor: &SourceDescriptor) -> Result<ResolvedSource> {
        self.resolver.resolve(descriptor)
    }

    pub async fn fetch_bytes(&self, resolved: &ResolvedSource) -> Result<Vec<u8>> {
        self.fetcher.fetch(resolved).await
    }

    pub fn parse_table(&self, bytes: &[u8], hints: &ParseHints) -> Result<Dataset> {
        parse_table(bytes, hints)
    }

    /// Load every descriptor, one result per descriptor in input order.
    ///
    /// Per-source failures come back as `LoadResult::Failed`. Only an
    /// unreachable secret store or a missing secret key fails the whole call,
    /// and that happens before any fetch.
    pub async fn load_all(
        &self,
        descriptors: &[SourceDescriptor],
        cache: &CacheConfig,
    ) -> Result<Vec<LoadResult>> {
        let start = Instant::now();
        let resolutions = self.resolve_all(descriptors)?;

        let results = if cache.enabled {
            let fingerprint = DatasetCache::fingerprint(&resolutions)?;
            self.cache
                .get_or_load(&fingerprint, cache.ttl_secs, || {
                    self.load_resolved(&resolutions)
                })
                .await
        } else {
            self.load_resolved(&resolutions).await
        };

        let loaded = results.iter().filter(|r| r.is_loaded()).count();
        info!(
            sources = results.len(),
            loaded,
            failed = results.len() - loaded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch load finished"
        );

        Ok(results)
    }

    /// Load the configured `sources` when auto-load is on. `None` when it is off.
    pub async fn load_configured(&self) -> Result<Option<Vec<LoadResult>>> {
        if !self.config.auto_load {
            info!("Auto-load disabled, skipping configured sources");
            return Ok(None);
        }

        let descriptors: Vec<SourceDescriptor> = self
            .config
            .sources
            .iter()
            .map(|location| SourceDescriptor::classify(location))
            .collect();

        let cache = CacheConfig::from(&self.config);
        self.load_all(&descriptors, &cache).await.map(Some)
    }

    /// Local descriptors for every CSV file in `dir` (default: the data folder).
    pub fn discover_folder(&self, dir: Option<&Path>) -> Result<Vec<SourceDescriptor>> {
        let dir = dir.unwrap_or(&self.config.data_dir);
        let files = discover_csv_files(dir)?;
        info!(folder = %dir.display(), files = files.len(), "Discovered CSV files");
        Ok(files.into_iter().map(SourceDescriptor::local).collect())
    }

    /// `load_all` followed by consolidation into one table.
    pub async fn load_and_consolidate(
        &self,
        descriptors: &[SourceDescriptor],
        cache: &CacheConfig,
    ) -> Result<ConsolidationReport> {
        let results = self.load_all(descriptors, cache).await?;
        Ok(consolidate(&results, self.config.source_column.as_deref()))
    }

    fn resolve_all(&self, descriptors: &[SourceDescriptor]) -> Result<Vec<Resolution>> {
        let mut resolutions = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let resolved = match self.resolver.resolve(descriptor) {
                Err(err) if err.is_config_fatal() => {
                    error!(source = %descriptor.label(), error = %err, "Secret resolution failed, aborting batch");
                    return Err(err);
                }
                other => other,
            };
            resolutions.push(Resolution {
                descriptor: descriptor.clone(),
                resolved,
            });
        }
        Ok(resolutions)
    }

    async fn load_resolved(&self, resolutions: &[Resolution]) -> Vec<LoadResult> {
        join_all(resolutions.iter().map(|resolution| self.load_one(resolution))).await
    }

    async fn load_one(&self, resolution: &Resolution) -> LoadResult {
        let descriptor = resolution.descriptor.clone();
        let outcome = match &resolution.resolved {
            Ok(resolved) => self.fetch_and_parse(&descriptor, resolved).await,
            Err(err) => Err(err.clone()),
        };

        match outcome {
            Ok(dataset) => LoadResult::Loaded {
                descriptor,
                dataset,
            },
            Err(error) => {
                warn!(
                    source = %descriptor.label(),
                    kind = ?error.kind(),
                    error = %error,
                    "Failed to load dataset"
                );
                LoadResult::Failed { descriptor, error }
            }
        }
    }

    async fn fetch_and_parse(
        &self,
        descriptor: &SourceDescriptor,
        resolved: &ResolvedSource,
    ) -> Result<Dataset> {
        let bytes = self.fetcher.fetch(resolved).await?;
        let dataset = parse_table(&bytes, &self.hints)?.with_source(descriptor.label());

        info!(
            source = %dataset.source,
            rows = dataset.len(),
            columns = dataset.columns.len(),
            encoding = %dataset.encoding,
            "Dataset loaded"
        );
        Ok(dataset)
    }
}
