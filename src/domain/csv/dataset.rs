// ============================================================
// DATASET
// ============================================================
// In-memory table produced by one successful load

use serde::{Deserialize, Serialize};

use super::CsvRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Header row, in file order
    pub columns: Vec<String>,

    /// Data rows (header excluded)
    pub rows: Vec<CsvRow>,

    /// Encoding label that decoded the payload
    pub encoding: String,

    /// Label of the source the data came from
    pub source: String,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<CsvRow>, encoding: impl Into<String>) -> Self {
        Self {
            columns,
            rows,
            encoding: encoding.into(),
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// All values of one column, in row order. `None` if the column is unknown.
    pub fn column(&self, column: &str) -> Option<Vec<&str>> {
        if !self.has_column(column) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|row| row.get(column).unwrap_or_default())
                .collect(),
        )
    }

    /// Tag every row with a constant provenance value.
    pub fn with_source_column(mut self, column: &str, value: &str) -> Self {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            row.set(column, value.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let columns = vec!["name".to_string(), "city".to_string()];
        let rows = vec![
            CsvRow::from_values(0, &columns, &["Alice".to_string(), "NYC".to_string()]),
            CsvRow::from_values(1, &columns, &["Bob".to_string()]),
        ];
        Dataset::new(columns, rows, "utf-8")
    }

    #[test]
    fn test_column_values_in_row_order() {
        let dataset = sample();
        assert_eq!(dataset.column("name"), Some(vec!["Alice", "Bob"]));
        assert_eq!(dataset.column("city"), Some(vec!["NYC", ""]));
        assert_eq!(dataset.column("missing"), None);
    }

    #[test]
    fn test_source_column_appended_once() {
        let dataset = sample()
            .with_source_column("source_file", "a.csv")
            .with_source_column("source_file", "b.csv");
        assert_eq!(dataset.columns, vec!["name", "city", "source_file"]);
        assert_eq!(dataset.rows[0].fields.len(), 3);
        assert_eq!(dataset.rows[1].get("source_file"), Some("b.csv"));
    }
}
