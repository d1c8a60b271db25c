// ============================================================
// CSV ROW TYPES
// ============================================================
// One decoded row: ordered fields plus a name -> value map

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single cell, kept as the raw decoded string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvField {
    /// Column name (header)
    pub name: String,

    /// Field value
    pub value: String,

    /// Whether the value is empty after trimming
    pub is_empty: bool,
}

impl CsvField {
    pub fn new(name: String, value: String) -> Self {
        let is_empty = value.trim().is_empty();
        Self {
            name,
            value,
            is_empty,
        }
    }
}

/// A single row in a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    /// Row index (0-based, header excluded)
    pub index: usize,

    /// Fields in column order
    pub fields: Vec<CsvField>,

    /// Column name -> value
    pub field_map: HashMap<String, String>,
}

impl CsvRow {
    pub fn new(index: usize, fields: Vec<CsvField>) -> Self {
        let field_map = fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();

        Self {
            index,
            fields,
            field_map,
        }
    }

    /// Build a row from parallel column names and values; missing values become "".
    pub fn from_values(index: usize, columns: &[String], values: &[String]) -> Self {
        let fields = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                CsvField::new(name.clone(), values.get(idx).cloned().unwrap_or_default())
            })
            .collect();
        Self::new(index, fields)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.field_map.get(column).map(String::as_str)
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.value.as_str())
    }

    pub fn non_empty_fields(&self) -> Vec<&CsvField> {
        self.fields.iter().filter(|f| !f.is_empty).collect()
    }

    /// Set a column value, appending the column when the row does not have it.
    pub fn set(&mut self, column: &str, value: String) {
        match self.fields.iter_mut().find(|f| f.name == column) {
            Some(field) => *field = CsvField::new(column.to_string(), value.clone()),
            None => self
                .fields
                .push(CsvField::new(column.to_string(), value.clone())),
        }
        self.field_map.insert(column.to_string(), value);
    }
}
