//! Bureau history aggregation.
//!
//! Collapses the one-to-many bureau table (several historical credits per
//! client) into one feature row per client. Numeric columns are summarized
//! with {mean, max, min, sum}; categorical columns are one-hot expanded
//! (including an explicit missing level, so absence of a category is itself a
//! signal) and summarized with the indicator mean, i.e. the fraction of the
//! client's records bearing that value.

use crate::error::Result;
use crate::table::{Column, Table};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Prefix stamped on every aggregate feature name so the join cannot collide
/// with primary-table columns.
pub const AGG_PREFIX: &str = "BURO";

/// Level name used for the explicit missing-category indicator.
pub const MISSING_LEVEL: &str = "MISSING";

/// Aggregates bureau records per client key.
pub struct BureauAggregator {
    client_key: String,
}

impl BureauAggregator {
    pub fn new(client_key: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
        }
    }

    /// Produce one row per distinct client key observed in the bureau table.
    ///
    /// Clients with zero bureau records never appear here; backfilling nulls
    /// for them is the join's responsibility. The output feature set is fully
    /// determined by the categorical vocabulary observed in this table.
    pub fn aggregate(&self, bureau: &Table) -> Result<Table> {
        let keys = bureau.integer_keys(&self.client_key)?;

        // Row indices per client, ordered by ascending key.
        let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (row, &key) in keys.iter().enumerate() {
            groups.entry(key).or_default().push(row);
        }

        let mut output = Table::new();
        output.push_column(
            self.client_key.clone(),
            Column::Numeric(groups.keys().map(|&k| Some(k as f64)).collect()),
        )?;

        for (name, column) in bureau.columns() {
            if name == self.client_key {
                continue;
            }
            match column {
                Column::Numeric(cells) => {
                    self.aggregate_numeric(name, cells, &groups, &mut output)?;
                }
                Column::Text(cells) => {
                    self.aggregate_categorical(name, cells, &groups, &mut output)?;
                }
            }
        }

        info!(
            clients = groups.len(),
            features = output.n_cols() - 1,
            "bureau history aggregated"
        );
        Ok(output)
    }

    fn aggregate_numeric(
        &self,
        name: &str,
        cells: &[Option<f64>],
        groups: &BTreeMap<i64, Vec<usize>>,
        output: &mut Table,
    ) -> Result<()> {
        let mut means = Vec::with_capacity(groups.len());
        let mut maxs = Vec::with_capacity(groups.len());
        let mut mins = Vec::with_capacity(groups.len());
        let mut sums = Vec::with_capacity(groups.len());

        for rows in groups.values() {
            let values: Vec<f64> = rows.iter().filter_map(|&r| cells[r]).collect();
            if values.is_empty() {
                // An entirely empty slice aggregates to null, not zero.
                means.push(None);
                maxs.push(None);
                mins.push(None);
                sums.push(None);
            } else {
                let sum: f64 = values.iter().sum();
                means.push(Some(sum / values.len() as f64));
                maxs.push(Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)));
                mins.push(Some(values.iter().copied().fold(f64::INFINITY, f64::min)));
                sums.push(Some(sum));
            }
        }

        let upper = name.to_uppercase();
        output.push_column(format!("{AGG_PREFIX}_{upper}_MEAN"), Column::Numeric(means))?;
        output.push_column(format!("{AGG_PREFIX}_{upper}_MAX"), Column::Numeric(maxs))?;
        output.push_column(format!("{AGG_PREFIX}_{upper}_MIN"), Column::Numeric(mins))?;
        output.push_column(format!("{AGG_PREFIX}_{upper}_SUM"), Column::Numeric(sums))?;
        Ok(())
    }

    fn aggregate_categorical(
        &self,
        name: &str,
        cells: &[Option<String>],
        groups: &BTreeMap<i64, Vec<usize>>,
        output: &mut Table,
    ) -> Result<()> {
        // Observed vocabulary in deterministic order, missing level last. The
        // missing indicator is tracked by flag, not by name: a literal
        // "MISSING" value is an ordinary observed level.
        let levels: BTreeSet<&str> = cells.iter().flatten().map(String::as_str).collect();

        for (level, is_missing) in levels
            .iter()
            .map(|&l| (l, false))
            .chain([(MISSING_LEVEL, true)])
        {
            let freqs: Vec<Option<f64>> = groups
                .values()
                .map(|rows| {
                    let hits = rows
                        .iter()
                        .filter(|&&r| match (&cells[r], is_missing) {
                            (None, missing) => missing,
                            (Some(v), false) => v == level,
                            (Some(_), true) => false,
                        })
                        .count();
                    Some(hits as f64 / rows.len() as f64)
                })
                .collect();

            // Uppercasing can make distinct levels collide, and a literal
            // "MISSING" level shares a name with the missing indicator.
            // Disambiguate deterministically with a numeric suffix.
            let upper = format!("{}_{}", name, level).to_uppercase();
            let mut column_name = format!("{AGG_PREFIX}_{upper}_MEAN");
            let mut suffix = 2;
            while output.has_column(&column_name) {
                column_name = format!("{AGG_PREFIX}_{upper}_{suffix}_MEAN");
                suffix += 1;
            }
            output.push_column(column_name, Column::Numeric(freqs))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bureau_table() -> Table {
        let mut table = Table::new();
        table
            .push_column(
                "SK_ID_CURR",
                Column::Numeric(vec![
                    Some(1001.0),
                    Some(1001.0),
                    Some(1001.0),
                    Some(1002.0),
                ]),
            )
            .unwrap();
        table
            .push_column(
                "AMT_CREDIT_SUM",
                Column::Numeric(vec![Some(10.0), Some(20.0), Some(30.0), None]),
            )
            .unwrap();
        table
            .push_column(
                "CREDIT_ACTIVE",
                Column::Text(vec![
                    Some("Active".to_string()),
                    Some("Closed".to_string()),
                    Some("Active".to_string()),
                    None,
                ]),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_numeric_statistics() {
        let agg = BureauAggregator::new("SK_ID_CURR").aggregate(&bureau_table()).unwrap();

        assert_eq!(agg.n_rows(), 2);
        assert_eq!(agg.numeric("SK_ID_CURR").unwrap()[0], Some(1001.0));
        assert_eq!(agg.numeric("BURO_AMT_CREDIT_SUM_MEAN").unwrap()[0], Some(20.0));
        assert_eq!(agg.numeric("BURO_AMT_CREDIT_SUM_MAX").unwrap()[0], Some(30.0));
        assert_eq!(agg.numeric("BURO_AMT_CREDIT_SUM_MIN").unwrap()[0], Some(10.0));
        assert_eq!(agg.numeric("BURO_AMT_CREDIT_SUM_SUM").unwrap()[0], Some(60.0));
    }

    #[test]
    fn test_all_null_slice_aggregates_to_null() {
        let agg = BureauAggregator::new("SK_ID_CURR").aggregate(&bureau_table()).unwrap();

        // Client 1002 has a single record whose numeric cell is null.
        for stat in ["MEAN", "MAX", "MIN", "SUM"] {
            let col = format!("BURO_AMT_CREDIT_SUM_{stat}");
            assert_eq!(agg.numeric(&col).unwrap()[1], None, "{col}");
        }
    }

    #[test]
    fn test_indicator_frequencies() {
        let agg = BureauAggregator::new("SK_ID_CURR").aggregate(&bureau_table()).unwrap();

        let active = agg.numeric("BURO_CREDIT_ACTIVE_ACTIVE_MEAN").unwrap();
        let closed = agg.numeric("BURO_CREDIT_ACTIVE_CLOSED_MEAN").unwrap();
        let missing = agg.numeric("BURO_CREDIT_ACTIVE_MISSING_MEAN").unwrap();

        // Client 1001: 2 of 3 Active, 1 of 3 Closed, none missing.
        assert!((active[0].unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((closed[0].unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(missing[0], Some(0.0));

        // Client 1002: its only record has no status, so missing is 1.0.
        assert_eq!(active[1], Some(0.0));
        assert_eq!(missing[1], Some(1.0));
    }

    #[test]
    fn test_vocabulary_determines_columns() {
        let agg = BureauAggregator::new("SK_ID_CURR").aggregate(&bureau_table()).unwrap();
        // A level never observed produces no column.
        assert!(!agg.has_column("BURO_CREDIT_ACTIVE_SOLD_MEAN"));
    }

    #[test]
    fn test_literal_missing_level_gets_its_own_column() {
        let mut table = Table::new();
        table
            .push_column(
                "SK_ID_CURR",
                Column::Numeric(vec![Some(1.0), Some(1.0), Some(1.0)]),
            )
            .unwrap();
        table
            .push_column(
                "STATUS",
                Column::Text(vec![
                    Some("MISSING".to_string()),
                    None,
                    Some("Active".to_string()),
                ]),
            )
            .unwrap();

        let agg = BureauAggregator::new("SK_ID_CURR").aggregate(&table).unwrap();

        // The observed literal level and the null indicator stay separate.
        let literal = agg.numeric("BURO_STATUS_MISSING_MEAN").unwrap();
        let nulls = agg.numeric("BURO_STATUS_MISSING_2_MEAN").unwrap();
        assert!((literal[0].unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((nulls[0].unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_levels_differing_only_by_case_do_not_collide() {
        let mut table = Table::new();
        table
            .push_column(
                "SK_ID_CURR",
                Column::Numeric(vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0)]),
            )
            .unwrap();
        table
            .push_column(
                "CREDIT_ACTIVE",
                Column::Text(vec![
                    Some("Active".to_string()),
                    Some("ACTIVE".to_string()),
                    Some("ACTIVE".to_string()),
                    Some("Closed".to_string()),
                ]),
            )
            .unwrap();

        let agg = BureauAggregator::new("SK_ID_CURR").aggregate(&table).unwrap();

        // Vocabulary order puts "ACTIVE" before "Active"; the second takes
        // the suffixed name.
        let upper = agg.numeric("BURO_CREDIT_ACTIVE_ACTIVE_MEAN").unwrap();
        let mixed = agg.numeric("BURO_CREDIT_ACTIVE_ACTIVE_2_MEAN").unwrap();
        assert_eq!(upper[0], Some(0.5));
        assert_eq!(mixed[0], Some(0.25));
        assert_eq!(
            agg.numeric("BURO_CREDIT_ACTIVE_CLOSED_MEAN").unwrap()[0],
            Some(0.25)
        );
    }

    #[test]
    fn test_output_ordered_by_client_key() {
        let mut table = Table::new();
        table
            .push_column(
                "SK_ID_CURR",
                Column::Numeric(vec![Some(9.0), Some(3.0), Some(9.0)]),
            )
            .unwrap();
        table
            .push_column("DAYS_CREDIT", Column::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();

        let agg = BureauAggregator::new("SK_ID_CURR").aggregate(&table).unwrap();
        assert_eq!(
            agg.numeric("SK_ID_CURR").unwrap(),
            &[Some(3.0), Some(9.0)]
        );
    }
}
