//! Left outer join of the primary application table with the aggregated
//! bureau features.
//!
//! Every primary-table row survives the join. Clients without bureau history
//! get null in every aggregate column — never zero, which would be a
//! misleading numeric encoding of "no history".

use crate::error::{PipelineError, Result};
use crate::table::{Column, Table};
use std::collections::{HashMap, HashSet};
use tracing::info;

pub struct FeatureJoiner {
    client_key: String,
}

impl FeatureJoiner {
    pub fn new(client_key: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
        }
    }

    /// Join `aggregates` onto `primary`. The output has exactly as many rows
    /// as `primary`, in the same order.
    ///
    /// Fails with [`PipelineError::SchemaMismatch`] if the join key is absent
    /// on either side, non-numeric, or duplicated on the primary side.
    pub fn join(&self, primary: &Table, aggregates: &Table) -> Result<Table> {
        let primary_keys = primary.integer_keys(&self.client_key)?;
        let aggregate_keys = aggregates.integer_keys(&self.client_key)?;

        let mut seen: HashSet<i64> = HashSet::with_capacity(primary_keys.len());
        for &key in &primary_keys {
            if !seen.insert(key) {
                return Err(PipelineError::SchemaMismatch(format!(
                    "duplicate primary key {key} in '{}'",
                    self.client_key
                )));
            }
        }

        let mut aggregate_rows: HashMap<i64, usize> =
            HashMap::with_capacity(aggregate_keys.len());
        for (row, &key) in aggregate_keys.iter().enumerate() {
            aggregate_rows.insert(key, row);
        }

        let mut output = Table::new();
        for (name, column) in primary.columns() {
            output.push_column(name, column.clone())?;
        }

        let mut matched = 0usize;
        for (name, column) in aggregates.columns() {
            if name == self.client_key {
                continue;
            }
            let joined = match column {
                Column::Numeric(cells) => Column::Numeric(
                    primary_keys
                        .iter()
                        .map(|key| aggregate_rows.get(key).and_then(|&r| cells[r]))
                        .collect(),
                ),
                Column::Text(cells) => Column::Text(
                    primary_keys
                        .iter()
                        .map(|key| aggregate_rows.get(key).and_then(|&r| cells[r].clone()))
                        .collect(),
                ),
            };
            output.push_column(name, joined)?;
        }
        for key in &primary_keys {
            if aggregate_rows.contains_key(key) {
                matched += 1;
            }
        }

        info!(
            rows = output.n_rows(),
            cols = output.n_cols(),
            matched,
            unmatched = primary_keys.len() - matched,
            "master table joined"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary() -> Table {
        let mut table = Table::new();
        table
            .push_column(
                "SK_ID_CURR",
                Column::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)]),
            )
            .unwrap();
        table
            .push_column(
                "AMT_INCOME_TOTAL",
                Column::Numeric(vec![Some(100.0), Some(200.0), Some(300.0)]),
            )
            .unwrap();
        table
    }

    fn aggregates() -> Table {
        let mut table = Table::new();
        table
            .push_column("SK_ID_CURR", Column::Numeric(vec![Some(1.0), Some(3.0)]))
            .unwrap();
        table
            .push_column(
                "BURO_DAYS_CREDIT_MEAN",
                Column::Numeric(vec![Some(-500.0), Some(-100.0)]),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_every_primary_row_survives() {
        let joined = FeatureJoiner::new("SK_ID_CURR")
            .join(&primary(), &aggregates())
            .unwrap();

        assert_eq!(joined.n_rows(), 3);
        assert_eq!(
            joined.numeric("SK_ID_CURR").unwrap(),
            &[Some(1.0), Some(2.0), Some(3.0)]
        );
    }

    #[test]
    fn test_unmatched_client_gets_null_not_zero() {
        let joined = FeatureJoiner::new("SK_ID_CURR")
            .join(&primary(), &aggregates())
            .unwrap();

        let col = joined.numeric("BURO_DAYS_CREDIT_MEAN").unwrap();
        assert_eq!(col, &[Some(-500.0), None, Some(-100.0)]);
    }

    #[test]
    fn test_duplicate_primary_key_rejected() {
        let mut dup = Table::new();
        dup.push_column(
            "SK_ID_CURR",
            Column::Numeric(vec![Some(1.0), Some(1.0)]),
        )
        .unwrap();

        let err = FeatureJoiner::new("SK_ID_CURR")
            .join(&dup, &aggregates())
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
    }

    #[test]
    fn test_missing_join_key_rejected() {
        let mut no_key = Table::new();
        no_key
            .push_column("OTHER", Column::Numeric(vec![Some(1.0)]))
            .unwrap();

        let err = FeatureJoiner::new("SK_ID_CURR")
            .join(&no_key, &aggregates())
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
    }
}
