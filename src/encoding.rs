//! Categorical encoding.
//!
//! A stable string-to-integer mapping per categorical column, fit once on
//! training data and frozen. The apply path is a pure function of the stored
//! table and its input: for any value present at fit time it reproduces the
//! training codes byte for byte.
//!
//! Unknown values seen only at inference map to [`UNKNOWN_CODE`] instead of
//! raising, so a novel category can never fail a request. The tradeoff: an
//! unseen value is silently aliased onto whichever training value received
//! code 0. Kept for compatibility with the trained artifacts; tested
//! explicitly rather than hidden.

use crate::error::{PipelineError, Result};
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Sentinel substituted for null cells before encoding.
pub const MISSING_SENTINEL: &str = "MISSING";

/// Fallback code for values unseen at fit time.
pub const UNKNOWN_CODE: u32 = 0;

/// Frozen encoding for one categorical column: code of a value is its index
/// in the lexicographically sorted class list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnEncoding {
    classes: Vec<String>,
}

impl ColumnEncoding {
    fn fit(values: BTreeSet<String>) -> Self {
        Self {
            classes: values.into_iter().collect(),
        }
    }

    /// Exact code of a fitted value.
    pub fn encode(&self, value: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
            .map(|i| i as u32)
    }

    /// Code of a value, falling back to [`UNKNOWN_CODE`] for values the fit
    /// never saw.
    pub fn encode_or_fallback(&self, value: &str) -> u32 {
        self.encode(value).unwrap_or(UNKNOWN_CODE)
    }

    /// Value that received the given code at fit time.
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn cardinality(&self) -> usize {
        self.classes.len()
    }
}

/// Per-column encodings, persisted alongside the model they were fit with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodingTable {
    columns: BTreeMap<String, ColumnEncoding>,
}

impl EncodingTable {
    pub fn column(&self, name: &str) -> Option<&ColumnEncoding> {
        self.columns.get(name)
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Fit/apply entry points shared by training, evaluation, and inference.
pub struct CategoricalEncoder;

impl CategoricalEncoder {
    /// Fit mode: enumerate the distinct values of every text column (nulls
    /// replaced by the [`MISSING_SENTINEL`]) and assign dense codes in
    /// lexicographic order.
    pub fn fit(table: &Table) -> EncodingTable {
        let mut columns = BTreeMap::new();
        for (name, column) in table.columns() {
            if let Column::Text(cells) = column {
                let values: BTreeSet<String> = cells
                    .iter()
                    .map(|c| c.clone().unwrap_or_else(|| MISSING_SENTINEL.to_string()))
                    .collect();
                columns.insert(name.to_string(), ColumnEncoding::fit(values));
            }
        }
        info!(columns = columns.len(), "categorical encoders fitted");
        EncodingTable { columns }
    }

    /// Apply mode: replace every fitted column in `table` with its integer
    /// codes. Values unseen at fit time fall back to [`UNKNOWN_CODE`].
    pub fn apply(encodings: &EncodingTable, table: &mut Table) -> Result<()> {
        for (name, encoding) in &encodings.columns {
            let Some(column) = table.column(name) else {
                continue;
            };
            let codes: Vec<Option<f64>> = match column {
                Column::Text(cells) => cells
                    .iter()
                    .map(|cell| {
                        let value = cell.as_deref().unwrap_or(MISSING_SENTINEL);
                        Some(encoding.encode_or_fallback(value) as f64)
                    })
                    .collect(),
                Column::Numeric(cells) => cells
                    .iter()
                    .map(|cell| {
                        let value = match cell {
                            Some(v) => format_scalar(*v),
                            None => MISSING_SENTINEL.to_string(),
                        };
                        Some(encoding.encode_or_fallback(&value) as f64)
                    })
                    .collect(),
            };
            table.replace_column(name, Column::Numeric(codes))?;
        }
        Ok(())
    }

    /// Encode one cell of a single request row. `value` is the stringified
    /// cell (null already replaced by the sentinel).
    pub fn encode_cell(encodings: &EncodingTable, column: &str, value: &str) -> Result<u32> {
        let encoding = encodings.column(column).ok_or_else(|| {
            PipelineError::SchemaMismatch(format!("column '{column}' has no encoding"))
        })?;
        Ok(encoding.encode_or_fallback(value))
    }
}

/// Turn an aligned request row into the numeric vector the scorer expects.
///
/// Categorical slots go through the stored encoding (null → sentinel,
/// unknown → fallback); numeric slots pass through with null as NaN. A text
/// value in a non-categorical slot is a request-level schema error.
pub fn encode_row(
    encodings: &EncodingTable,
    schema: &crate::model::ModelSchema,
    values: &[crate::align::FeatureValue],
) -> Result<Vec<f64>> {
    use crate::align::FeatureValue;

    debug_assert_eq!(schema.len(), values.len());
    schema
        .columns()
        .iter()
        .zip(values)
        .map(|(column, value)| {
            if let Some(encoding) = encodings.column(column) {
                let text = match value {
                    FeatureValue::Text(s) => s.clone(),
                    FeatureValue::Number(v) => format_scalar(*v),
                    FeatureValue::Null => MISSING_SENTINEL.to_string(),
                };
                Ok(encoding.encode_or_fallback(&text) as f64)
            } else {
                match value {
                    FeatureValue::Number(v) => Ok(*v),
                    FeatureValue::Null => Ok(f64::NAN),
                    FeatureValue::Text(s) => Err(PipelineError::SchemaMismatch(format!(
                        "column '{column}' expects a number, got '{s}'"
                    ))),
                }
            }
        })
        .collect()
}

/// Render a numeric cell the way a categorical column would have carried it
/// as text. Integral values print without a fractional part, so the aligner's
/// neutral fill (0) stringifies to "0".
pub fn format_scalar(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
