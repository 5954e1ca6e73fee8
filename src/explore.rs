//! Exploratory analysis stage.
//!
//! Reports dataset dimensions, target class balance, and the per-client
//! bureau record distribution to the log and a text file. Plotting belongs
//! to downstream consumers; this stage only produces numbers.

use crate::config::AppConfig;
use crate::error::Result;
use crate::table::Table;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn run(config: &AppConfig) -> Result<String> {
    let application = Table::from_csv(&config.data.application_path)?;
    let bureau = Table::from_csv(&config.data.bureau_path)?;

    let mut report = String::new();
    report.push_str("ANALISIS INICIAL\n================\n\n");
    report.push_str(&format!(
        "Application: {} rows x {} cols\n",
        application.n_rows(),
        application.n_cols()
    ));
    report.push_str(&format!(
        "Bureau:      {} rows x {} cols\n\n",
        bureau.n_rows(),
        bureau.n_cols()
    ));

    // Target class balance.
    match application.numeric(&config.data.target) {
        Ok(cells) => {
            let total = cells.iter().flatten().count();
            let positives = cells.iter().flatten().filter(|&&y| y == 1.0).count();
            if total > 0 {
                let pos_pct = 100.0 * positives as f64 / total as f64;
                report.push_str(&format!(
                    "Target distribution: 0 (paga) {:.2}% | 1 (default) {:.2}%\n\n",
                    100.0 - pos_pct,
                    pos_pct
                ));
                info!(default_rate = format!("{pos_pct:.2}%"), "target balance");
            }
        }
        Err(_) => {
            warn!(target = %config.data.target, "target column not found");
            report.push_str("Target column not found.\n\n");
        }
    }

    // Bureau records per client.
    let keys = bureau.integer_keys(&config.data.client_key)?;
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    if !counts.is_empty() {
        let values: Vec<usize> = counts.values().copied().collect();
        let total: usize = values.iter().sum();
        let mean = total as f64 / values.len() as f64;
        let min = *values.iter().min().unwrap();
        let max = *values.iter().max().unwrap();
        report.push_str(&format!(
            "Bureau records per client: clients={} mean={:.2} min={} max={}\n",
            values.len(),
            mean,
            min,
            max
        ));
        info!(clients = values.len(), mean = format!("{mean:.2}"), min, max, "bureau history profile");
    }

    fs::create_dir_all(&config.data.reports_dir)?;
    let report_path = Path::new(&config.data.reports_dir).join("analisis_inicial.txt");
    fs::write(&report_path, &report)?;
    info!(path = %report_path.display(), "exploration report written");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explore_reports_balance_and_history() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("application.csv"),
            "SK_ID_CURR,TARGET\n1,0\n2,1\n3,0\n4,0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("bureau.csv"),
            "SK_ID_CURR,DAYS_CREDIT\n1,-10\n1,-20\n2,-30\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.data.application_path =
            dir.path().join("application.csv").to_string_lossy().into_owned();
        config.data.bureau_path = dir.path().join("bureau.csv").to_string_lossy().into_owned();
        config.data.reports_dir = dir.path().join("reports").to_string_lossy().into_owned();

        let report = run(&config).unwrap();
        assert!(report.contains("1 (default) 25.00%"));
        assert!(report.contains("clients=2 mean=1.50 min=1 max=2"));
    }
}
