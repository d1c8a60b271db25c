pub mod use_cases;

pub use use_cases::consolidation::{consolidate, export_csv, ConsolidationReport, FailedSource};
pub use use_cases::dataset_cache::{Clock, DatasetCache, DatasetCacheStats, SystemClock};
pub use use_cases::dataset_loader::DatasetLoader;
pub use use_cases::source_resolver::{drive_download_url, dropbox_download_url, SourceResolver};
