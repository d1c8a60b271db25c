pub mod http;
pub mod local;

use crate::domain::error::Result;
use crate::domain::source::ResolvedSource;
use async_trait::async_trait;
use self::http::HttpFetcher;
use self::local::LocalFileFetcher;

/// Turns a resolved source into raw bytes. No retries: one call, one attempt.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn fetch(&self, source: &ResolvedSource) -> Result<Vec<u8>>;
}

/// Dispatches paths to the filesystem and URLs to HTTP.
pub struct RouterFetcher {
    local: LocalFileFetcher,
    http: HttpFetcher,
}

impl RouterFetcher {
    pub fn new(http_timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            local: LocalFileFetcher,
            http: HttpFetcher::with_timeout(http_timeout_secs)?,
        })
    }
}

#[async_trait]
impl ByteFetcher for RouterFetcher {
    async fn fetch(&self, source: &ResolvedSource) -> Result<Vec<u8>> {
        match source {
            ResolvedSource::Path(_) => self.local.fetch(source).await,
            ResolvedSource::Url(_) => self.http.fetch(source).await,
        }
    }
}
