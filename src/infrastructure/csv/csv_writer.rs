// ============================================================
// CSV WRITER
// ============================================================
// Export a dataset as UTF-8 CSV with a header row

use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;

use crate::domain::csv::Dataset;
use crate::domain::error::{AppError, Result};

/// Write `dataset` to any writer, columns in dataset order
pub fn write_dataset_to<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    if !dataset.columns.is_empty() {
        csv_writer
            .write_record(&dataset.columns)
            .map_err(|e| AppError::IoError(format!("Failed to write CSV header: {}", e)))?;
    }

    for row in &dataset.rows {
        let record: Vec<&str> = dataset
            .columns
            .iter()
            .map(|column| row.get(column).unwrap_or_default())
            .collect();
        csv_writer.write_record(&record).map_err(|e| {
            AppError::IoError(format!("Failed to write CSV row {}: {}", row.index + 1, e))
        })?;
    }

    csv_writer
        .flush()
        .map_err(|e| AppError::IoError(format!("Failed to flush CSV output: {}", e)))
}

/// Write `dataset` to a file, creating parent directories as needed
pub fn write_dataset(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path).map_err(|e| {
        AppError::IoError(format!("Failed to create {}: {}", path.display(), e))
    })?;
    write_dataset_to(dataset, file)
}
