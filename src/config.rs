//! Configuration management for the credit risk pipeline.

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// Dataset locations and schema anchors.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Primary application table (CSV, one row per client).
    pub application_path: String,
    /// Bureau history table (CSV, many rows per client).
    pub bureau_path: String,
    /// Where the joined master table is persisted.
    pub master_path: String,
    /// Directory for the trained artifact triple.
    pub artifacts_dir: String,
    /// Directory for text reports produced by explore/evaluate.
    pub reports_dir: String,
    /// Client identifier column shared by application and bureau tables.
    #[serde(default = "default_client_key")]
    pub client_key: String,
    /// Binary label column on the application table.
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_client_key() -> String {
    "SK_ID_CURR".to_string()
}

fn default_target() -> String {
    "TARGET".to_string()
}

/// Training configuration.
///
/// The split seed is versioned configuration, not a hardcoded literal: the
/// training and evaluation stages must read the same value or their metrics
/// are not comparable.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// Seed for the stratified train/test split.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Fraction of rows held out for testing.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Number of boosting rounds.
    #[serde(default = "default_trees")]
    pub trees: usize,
    /// Shrinkage applied to each tree's contribution.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Maximum tree depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Minimum samples per leaf.
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Cap on split candidates considered per feature.
    #[serde(default = "default_max_split_candidates")]
    pub max_split_candidates: usize,
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_trees() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.05
}

fn default_max_depth() -> usize {
    6
}

fn default_min_samples_leaf() -> usize {
    20
}

fn default_max_split_candidates() -> usize {
    32
}

/// Scoring service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
}

impl AppConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                application_path: "data/application.csv".to_string(),
                bureau_path: "data/bureau.csv".to_string(),
                master_path: "data/dataset_maestro.json".to_string(),
                artifacts_dir: "artifacts".to_string(),
                reports_dir: "reports".to_string(),
                client_key: default_client_key(),
                target: default_target(),
            },
            training: TrainingConfig {
                seed: default_seed(),
                test_fraction: default_test_fraction(),
                trees: default_trees(),
                learning_rate: default_learning_rate(),
                max_depth: default_max_depth(),
                min_samples_leaf: default_min_samples_leaf(),
                max_split_candidates: default_max_split_candidates(),
            },
            service: ServiceConfig {
                bind_addr: "0.0.0.0:8000".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.data.client_key, "SK_ID_CURR");
        assert_eq!(config.data.target, "TARGET");
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.service.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[data]
application_path = "d/app.csv"
bureau_path = "d/bureau.csv"
master_path = "d/master.json"
artifacts_dir = "a"
reports_dir = "r"

[training]
seed = 7
trees = 10

[service]
bind_addr = "127.0.0.1:9000"

[logging]
level = "debug"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.trees, 10);
        // Defaults fill the unspecified training fields.
        assert_eq!(config.training.max_depth, 6);
        assert_eq!(config.data.client_key, "SK_ID_CURR");
    }
}
