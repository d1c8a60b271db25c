// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Core types for decoded tabular data
// No I/O, no async

mod csv_row;
mod dataset;
mod parse_hints;

pub use csv_row::{CsvField, CsvRow};
pub use dataset::Dataset;
pub use parse_hints::{ParseHints, LATIN1_LABEL, UTF8_LABEL};
