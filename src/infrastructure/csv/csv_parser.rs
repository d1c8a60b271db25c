// ============================================================
// CSV PARSER
// ============================================================
// Decode bytes with encoding fallback and parse delimited text

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use tracing::debug;

use super::encoding::decode_with_fallback;
use crate::domain::csv::{CsvRow, Dataset, ParseHints};
use crate::domain::error::{AppError, Result};

/// CSV parser configured from [`ParseHints`]
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    /// Delimiter; detected per payload when `None`
    delimiter: Option<u8>,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hints(hints: &ParseHints) -> Self {
        Self {
            delimiter: hints.delimiter,
            trim: hints.trim,
        }
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set whether to trim whitespace
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Decode `bytes` with the ordered encodings, then parse the text.
    pub fn parse_bytes(&self, bytes: &[u8], encodings: &[String]) -> Result<Dataset> {
        let (content, encoding) = decode_with_fallback(bytes, encodings)?;
        let (columns, rows) = self.parse_content(&content)?;

        debug!(
            encoding = %encoding,
            columns = columns.len(),
            rows = rows.len(),
            "Parsed delimited payload"
        );

        Ok(Dataset::new(columns, rows, encoding))
    }

    /// Parse CSV content from string, returning header names and rows
    pub fn parse_content(&self, content: &str) -> Result<(Vec<String>, Vec<CsvRow>)> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();
        let columns = Self::column_names(&headers);

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            // Short rows are padded, long rows are an error
            if record.len() > columns.len() {
                return Err(AppError::ParseError(format!(
                    "CSV row {} has {} fields, header has {}",
                    index + 1,
                    record.len(),
                    columns.len()
                )));
            }
            rows.push(Self::parse_row(index, &columns, &record));
        }

        Ok((columns, rows))
    }

    /// Header names with blanks filled in and duplicates made unique
    /// (`Unnamed: 2`, `value.1`), so every column is addressable by name.
    fn column_names(headers: &StringRecord) -> Vec<String> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut columns = Vec::with_capacity(headers.len());

        for (idx, header) in headers.iter().enumerate() {
            let base = if header.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                header.to_string()
            };

            let mut name = base.clone();
            while seen.contains_key(&name) {
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                name = format!("{}.{}", base, count);
            }
            seen.insert(name.clone(), 0);
            columns.push(name);
        }

        columns
    }

    fn parse_row(index: usize, columns: &[String], record: &StringRecord) -> CsvRow {
        let values: Vec<String> = record.iter().map(str::to_string).collect();
        CsvRow::from_values(index, columns, &values)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// Decode and parse one payload according to `hints`.
pub fn parse_table(bytes: &[u8], hints: &ParseHints) -> Result<Dataset> {
    CsvParser::from_hints(hints).parse_bytes(bytes, &hints.encodings)
}
