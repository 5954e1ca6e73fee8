//! Independent evaluation stage.
//!
//! Reloads the master table and the trained artifact triple, re-applies the
//! stored encoders (never refitting them), rebuilds the identical stratified
//! split, and writes a plain-text metrics report: AUC-ROC, the confusion
//! matrix at the decision threshold, and a per-class classification report.

use crate::artifacts::ModelArtifacts;
use crate::config::AppConfig;
use crate::encoding::CategoricalEncoder;
use crate::error::Result;
use crate::metrics::{roc_auc, ConfusionMatrix};
use crate::model::Scorer;
use crate::service::DECISION_THRESHOLD;
use crate::split::stratified_split;
use crate::table::Table;
use crate::train::{design_matrix, extract_labels};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn run(config: &AppConfig) -> Result<String> {
    let mut master = Table::load(&config.data.master_path)?;
    let artifacts = ModelArtifacts::load(&config.data.artifacts_dir)?;

    if artifacts.metadata.seed != config.training.seed {
        warn!(
            artifact_seed = artifacts.metadata.seed,
            config_seed = config.training.seed,
            "split seed differs from the one the model was trained with; metrics will not be comparable"
        );
    }

    // Apply the stored encoders; fitting here would drift from training.
    CategoricalEncoder::apply(&artifacts.encodings, &mut master)?;

    let labels = extract_labels(&master, &config.data.target)?;
    let matrix = design_matrix(&master, &artifacts.schema)?;

    let split = stratified_split(&labels, config.training.test_fraction, config.training.seed)?;
    let test_matrix: Vec<Vec<f64>> = split.test.iter().map(|&i| matrix[i].clone()).collect();
    let test_labels: Vec<f64> = split.test.iter().map(|&i| labels[i]).collect();

    info!(test_rows = test_labels.len(), "scoring held-out partition");
    let probabilities = artifacts.model.predict_proba(&test_matrix);

    let auc = roc_auc(&test_labels, &probabilities);
    let confusion = ConfusionMatrix::at_threshold(&test_labels, &probabilities, DECISION_THRESHOLD);

    let mut report = String::new();
    report.push_str("REPORTE DE EVALUACION DEL MODELO\n");
    report.push_str("================================\n\n");
    report.push_str(&format!("Test rows: {}\n", test_labels.len()));
    report.push_str(&format!("Decision threshold: {DECISION_THRESHOLD}\n\n"));
    report.push_str(&confusion.classification_report());
    report.push('\n');
    match auc {
        Some(auc) => report.push_str(&format!("AUC-ROC Score: {auc:.4}\n")),
        None => report.push_str("AUC-ROC Score: undefined (single-class test set)\n"),
    }
    report.push_str(&format!(
        "\nConfusion matrix (rows = actual, cols = predicted)\n\
         \t\tpaga\tdefault\n\
         paga\t\t{}\t{}\n\
         default\t\t{}\t{}\n",
        confusion.true_negatives,
        confusion.false_positives,
        confusion.false_negatives,
        confusion.true_positives
    ));

    let report_path = Path::new(&config.data.reports_dir).join("metricas_finales.txt");
    fs::create_dir_all(&config.data.reports_dir)?;
    fs::write(&report_path, &report)?;
    info!(path = %report_path.display(), "evaluation report written");

    Ok(report)
}
