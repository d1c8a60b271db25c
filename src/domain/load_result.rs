use serde::Serialize;

use super::csv::Dataset;
use super::error::AppError;
use super::source::SourceDescriptor;

/// Outcome of loading one descriptor. Failures are data, not panics or early returns.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadResult {
    Loaded {
        descriptor: SourceDescriptor,
        dataset: Dataset,
    },
    Failed {
        descriptor: SourceDescriptor,
        error: AppError,
    },
}

impl LoadResult {
    pub fn descriptor(&self) -> &SourceDescriptor {
        match self {
            LoadResult::Loaded { descriptor, .. } | LoadResult::Failed { descriptor, .. } => {
                descriptor
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadResult::Loaded { .. })
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            LoadResult::Loaded { dataset, .. } => Some(dataset),
            LoadResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            LoadResult::Failed { error, .. } => Some(error),
            LoadResult::Loaded { .. } => None,
        }
    }
}
