pub mod consolidation;
pub mod dataset_cache;
pub mod dataset_loader;
pub mod source_resolver;
