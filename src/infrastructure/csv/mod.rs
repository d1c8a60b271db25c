// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Encoding fallback, CSV parsing and CSV export

mod csv_parser;
mod csv_writer;
mod encoding;

pub use csv_parser::{parse_table, CsvParser};
pub use csv_writer::{write_dataset, write_dataset_to};
pub use encoding::{decode_with_fallback, encoding_for_label};
