use super::ByteFetcher;
use crate::domain::error::{AppError, Result};
use crate::domain::source::ResolvedSource;
use crate::infrastructure::storage::read_local_file;
use async_trait::async_trait;
use tracing::debug;

pub struct LocalFileFetcher;

#[async_trait]
impl ByteFetcher for LocalFileFetcher {
    async fn fetch(&self, source: &ResolvedSource) -> Result<Vec<u8>> {
        let path = source.as_path().ok_or_else(|| {
            AppError::Internal(format!("Local fetcher cannot read {:?}", source))
        })?;

        let bytes = read_local_file(path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Read local file");
        Ok(bytes)
    }
}
