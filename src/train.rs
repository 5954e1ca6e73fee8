//! Training stage.
//!
//! Fits the categorical encoders on the master table, freezes the feature
//! schema, trains the GBDT on a stratified 80/20 split, reports the held-out
//! AUC-ROC, and persists the artifact triple atomically. Any failure aborts
//! the stage before anything is written.

use crate::artifacts::{ArtifactMetadata, ModelArtifacts};
use crate::config::AppConfig;
use crate::encoding::CategoricalEncoder;
use crate::error::{PipelineError, Result};
use crate::metrics::roc_auc;
use crate::model::{GbdtTrainer, ModelSchema, Scorer, TrainerConfig};
use crate::split::stratified_split;
use crate::table::Table;
use chrono::Utc;
use tracing::{info, warn};

/// Feature columns in master-table order: everything except the label and
/// the client identifier.
pub fn feature_schema(master: &Table, config: &AppConfig) -> ModelSchema {
    ModelSchema::new(
        master
            .column_names()
            .filter(|&name| name != config.data.target && name != config.data.client_key)
            .map(str::to_string)
            .collect(),
    )
}

/// Materialize the design matrix for `schema` from an encoded master table.
/// Null cells become NaN, which the scorer treats as missing.
pub fn design_matrix(master: &Table, schema: &ModelSchema) -> Result<Vec<Vec<f64>>> {
    let mut columns = Vec::with_capacity(schema.len());
    for name in schema.columns() {
        columns.push(master.numeric(name)?);
    }

    let mut rows = Vec::with_capacity(master.n_rows());
    for r in 0..master.n_rows() {
        rows.push(columns.iter().map(|col| col[r].unwrap_or(f64::NAN)).collect());
    }
    Ok(rows)
}

/// Labels must be present on every row; a null label is a schema error.
pub fn extract_labels(master: &Table, target: &str) -> Result<Vec<f64>> {
    master
        .numeric(target)?
        .iter()
        .enumerate()
        .map(|(row, cell)| {
            cell.ok_or_else(|| {
                PipelineError::SchemaMismatch(format!("null label in '{target}' at row {row}"))
            })
        })
        .collect()
}

pub fn run(config: &AppConfig) -> Result<ModelArtifacts> {
    let mut master = Table::load(&config.data.master_path)?;
    info!(rows = master.n_rows(), cols = master.n_cols(), "master table loaded");

    // Fit and apply the encoders before anything else touches the table.
    let encodings = CategoricalEncoder::fit(&master);
    CategoricalEncoder::apply(&encodings, &mut master)?;

    let schema = feature_schema(&master, config);
    let labels = extract_labels(&master, &config.data.target)?;
    let matrix = design_matrix(&master, &schema)?;

    let split = stratified_split(&labels, config.training.test_fraction, config.training.seed)?;
    info!(
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        seed = config.training.seed,
        "stratified split done"
    );

    let train_matrix: Vec<Vec<f64>> = split.train.iter().map(|&i| matrix[i].clone()).collect();
    let train_labels: Vec<f64> = split.train.iter().map(|&i| labels[i]).collect();

    info!(
        trees = config.training.trees,
        max_depth = config.training.max_depth,
        learning_rate = config.training.learning_rate,
        "training GBDT"
    );
    let trainer = GbdtTrainer::new(TrainerConfig::from(&config.training));
    let model = trainer.fit(&train_matrix, &train_labels)?;

    let test_matrix: Vec<Vec<f64>> = split.test.iter().map(|&i| matrix[i].clone()).collect();
    let test_labels: Vec<f64> = split.test.iter().map(|&i| labels[i]).collect();
    let test_probs = model.predict_proba(&test_matrix);
    let test_auc = roc_auc(&test_labels, &test_probs);
    match test_auc {
        Some(auc) => info!(auc = format!("{auc:.4}"), "held-out AUC-ROC"),
        None => warn!("held-out AUC-ROC undefined (single-class test set)"),
    }

    let artifacts = ModelArtifacts {
        encodings,
        schema,
        model,
        metadata: ArtifactMetadata {
            created_at: Utc::now(),
            seed: config.training.seed,
            training_rows: train_labels.len(),
            test_auc,
        },
    };
    artifacts.save(&config.data.artifacts_dir)?;
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn master_table(rows: usize) -> Table {
        let mut table = Table::new();
        table
            .push_column(
                "SK_ID_CURR",
                Column::Numeric((0..rows).map(|i| Some(i as f64)).collect()),
            )
            .unwrap();
        table
            .push_column(
                "TARGET",
                Column::Numeric((0..rows).map(|i| Some((i % 2) as f64)).collect()),
            )
            .unwrap();
        table
            .push_column(
                "AMT_INCOME_TOTAL",
                Column::Numeric((0..rows).map(|i| Some(1000.0 + i as f64)).collect()),
            )
            .unwrap();
        table
            .push_column(
                "CODE_GENDER",
                Column::Text((0..rows).map(|i| Some(if i % 2 == 0 { "M" } else { "F" }.to_string())).collect()),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_schema_excludes_target_and_key() {
        let table = master_table(10);
        let schema = feature_schema(&table, &AppConfig::default());
        assert_eq!(
            schema.columns(),
            &["AMT_INCOME_TOTAL".to_string(), "CODE_GENDER".to_string()]
        );
    }

    #[test]
    fn test_design_matrix_nulls_become_nan() {
        let mut table = Table::new();
        table
            .push_column("A", Column::Numeric(vec![Some(1.0), None]))
            .unwrap();
        let schema = ModelSchema::new(vec!["A".to_string()]);
        let matrix = design_matrix(&table, &schema).unwrap();
        assert_eq!(matrix[0], vec![1.0]);
        assert!(matrix[1][0].is_nan());
    }

    #[test]
    fn test_null_label_rejected() {
        let mut table = Table::new();
        table
            .push_column("TARGET", Column::Numeric(vec![Some(1.0), None]))
            .unwrap();
        assert!(matches!(
            extract_labels(&table, "TARGET").unwrap_err(),
            PipelineError::SchemaMismatch(_)
        ));
    }

    #[test]
    fn test_train_persists_artifact_triple() {
        let dir = tempfile::tempdir().unwrap();
        let master = master_table(40);
        let master_path = dir.path().join("master.json");
        master.save(&master_path).unwrap();

        let mut config = AppConfig::default();
        config.data.master_path = master_path.to_string_lossy().into_owned();
        config.data.artifacts_dir = dir.path().join("artifacts").to_string_lossy().into_owned();
        config.training.trees = 5;
        config.training.min_samples_leaf = 2;

        let artifacts = run(&config).unwrap();
        assert_eq!(artifacts.schema.len(), 2);
        assert_eq!(artifacts.metadata.seed, 42);

        let loaded = ModelArtifacts::load(&config.data.artifacts_dir).unwrap();
        assert_eq!(artifacts, loaded);
    }

    #[test]
    fn test_missing_master_fails_stage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.data.master_path = dir.path().join("nope.json").to_string_lossy().into_owned();
        assert!(matches!(
            run(&config).unwrap_err(),
            PipelineError::MissingInputArtifact { .. }
        ));
    }
}
