//! Columnar tabular store.
//!
//! Datasets are held fully in memory as named columns, either numeric or
//! text, with per-cell nulls. Source data is ingested from CSV (column types
//! inferred) and intermediate datasets are persisted as columnar JSON
//! documents.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// A single column: all cells share one type, any cell may be null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-memory columnar table with a deterministic column order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), col))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Append a column. The first column fixes the row count; later columns
    /// must match it.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(PipelineError::SchemaMismatch(format!(
                "duplicate column '{name}'"
            )));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(PipelineError::SchemaMismatch(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.n_rows
            )));
        }
        self.columns.push((name, column));
        Ok(())
    }

    /// Replace an existing column in place, keeping its position.
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<()> {
        if column.len() != self.n_rows {
            return Err(PipelineError::SchemaMismatch(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.n_rows
            )));
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = column;
                Ok(())
            }
            None => Err(PipelineError::SchemaMismatch(format!(
                "column '{name}' not found"
            ))),
        }
    }

    /// Numeric cells of a column, or a schema error if the column is missing
    /// or holds text.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name) {
            Some(Column::Numeric(v)) => Ok(v),
            Some(Column::Text(_)) => Err(PipelineError::SchemaMismatch(format!(
                "column '{name}' is text, expected numeric"
            ))),
            None => Err(PipelineError::SchemaMismatch(format!(
                "column '{name}' not found"
            ))),
        }
    }

    /// Integer keys of a column. Every cell must be present and integral: a
    /// null key would make the join undefined, and truncating a fractional
    /// key would silently alias two clients.
    pub fn integer_keys(&self, name: &str) -> Result<Vec<i64>> {
        let cells = self.numeric(name)?;
        cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                let v = cell.ok_or_else(|| {
                    PipelineError::SchemaMismatch(format!("null key in '{name}' at row {row}"))
                })?;
                if v.fract() != 0.0 {
                    return Err(PipelineError::SchemaMismatch(format!(
                        "non-integer key {v} in '{name}' at row {row}"
                    )));
                }
                Ok(v as i64)
            })
            .collect()
    }

    /// Load a CSV file, inferring each column as numeric when every non-empty
    /// cell parses as a float, text otherwise. Empty cells become null.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingInputArtifact {
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(PipelineError::SchemaMismatch(format!(
                    "CSV row has {} fields, header has {}",
                    record.len(),
                    headers.len()
                )));
            }
            for (i, field) in record.iter().enumerate() {
                let cell = if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                };
                raw[i].push(cell);
            }
        }

        let mut table = Table::new();
        for (name, cells) in headers.into_iter().zip(raw) {
            let numeric = cells
                .iter()
                .flatten()
                .all(|s| s.parse::<f64>().is_ok());
            let has_values = cells.iter().any(Option::is_some);
            let column = if numeric && has_values {
                Column::Numeric(
                    cells
                        .iter()
                        .map(|c| c.as_ref().map(|s| s.parse::<f64>().unwrap()))
                        .collect(),
                )
            } else {
                Column::Text(cells)
            };
            table.push_column(name, column)?;
        }

        info!(
            path = %path.display(),
            rows = table.n_rows(),
            cols = table.n_cols(),
            "CSV loaded"
        );
        Ok(table)
    }

    /// Persist the table as a columnar JSON document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), rows = self.n_rows(), "table saved");
        Ok(())
    }

    /// Load a previously persisted table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingInputArtifact {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
