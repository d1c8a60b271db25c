// ============================================================
// CONSOLIDATION
// ============================================================
// Stack successful loads into one table, tagging each row with its origin

use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::csv::{CsvRow, Dataset};
use crate::domain::error::{AppError, Result};
use crate::domain::load_result::LoadResult;
use crate::domain::source::SourceDescriptor;
use crate::infrastructure::csv::write_dataset;

/// Provenance prefix for remote sources, followed by the 1-based input position
pub const REMOTE_LABEL_PREFIX: &str = "URL_";

pub const CONSOLIDATED_SOURCE: &str = "consolidated";

#[derive(Debug, Clone, Serialize)]
pub struct FailedSource {
    pub source: String,
    pub error: AppError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationReport {
    pub dataset: Dataset,
    pub loaded: usize,
    pub failed: Vec<FailedSource>,
}

impl ConsolidationReport {
    pub fn total_rows(&self) -> usize {
        self.dataset.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// File name for local sources, `URL_<n>` for everything fetched remotely.
pub fn provenance_label(descriptor: &SourceDescriptor, position: usize) -> String {
    match descriptor {
        SourceDescriptor::LocalPath { path } => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        _ => format!("{}{}", REMOTE_LABEL_PREFIX, position + 1),
    }
}

/// Union of columns in first-seen order; rows missing a column get "".
pub fn consolidate(results: &[LoadResult], source_column: Option<&str>) -> ConsolidationReport {
    let mut columns: Vec<String> = Vec::new();
    let mut stacked: Vec<CsvRow> = Vec::new();
    let mut encodings: Vec<String> = Vec::new();
    let mut failed = Vec::new();
    let mut loaded = 0;

    for (position, result) in results.iter().enumerate() {
        let (descriptor, dataset) = match result {
            LoadResult::Loaded {
                descriptor,
                dataset,
            } => (descriptor, dataset),
            LoadResult::Failed { descriptor, error } => {
                failed.push(FailedSource {
                    source: descriptor.label(),
                    error: error.clone(),
                });
                continue;
            }
        };

        loaded += 1;
        let dataset = match source_column {
            Some(column) => dataset
                .clone()
                .with_source_column(column, &provenance_label(descriptor, position)),
            None => dataset.clone(),
        };

        for column in &dataset.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        if !encodings.contains(&dataset.encoding) {
            encodings.push(dataset.encoding.clone());
        }
        stacked.extend(dataset.rows);
    }

    let rows: Vec<CsvRow> = stacked
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let values: Vec<String> = columns
                .iter()
                .map(|column| row.get(column).unwrap_or_default().to_string())
                .collect();
            CsvRow::from_values(index, &columns, &values)
        })
        .collect();

    if !failed.is_empty() {
        warn!(failed = failed.len(), "Some sources were left out of the consolidated table");
    }
    info!(
        loaded,
        rows = rows.len(),
        columns = columns.len(),
        "Consolidated datasets"
    );

    ConsolidationReport {
        dataset: Dataset::new(columns, rows, encodings.join("+")).with_source(CONSOLIDATED_SOURCE),
        loaded,
        failed,
    }
}

/// Write the consolidated table as UTF-8 CSV.
pub fn export_csv(report: &ConsolidationReport, path: &Path) -> Result<()> {
    write_dataset(&report.dataset, path)?;
    info!(path = %path.display(), rows = report.total_rows(), "Exported consolidated CSV");
    Ok(())
}
