pub mod error;
pub mod load_result;
pub mod loader_config;
pub mod source;

// Decoded tabular data
pub mod csv;
