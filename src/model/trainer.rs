//! GBDT training with logistic loss.
//!
//! Each boosting round fits a regression tree to the current
//! gradient/hessian pairs (g = p - y, h = p(1 - p)) and adds its shrunken
//! output to the raw scores. Training is deterministic: same matrix, labels,
//! and configuration produce an identical model.

use crate::config::TrainingConfig;
use crate::error::{PipelineError, Result};
use crate::model::cart::{CartBuilder, TreeParams};
use crate::model::gbdt::{sigmoid, GbdtModel};
use tracing::debug;

/// Boosting hyperparameters.
#[derive(Clone, Debug)]
pub struct TrainerConfig {
    pub trees: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub max_split_candidates: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            learning_rate: 0.05,
            max_depth: 6,
            min_samples_leaf: 20,
            max_split_candidates: 32,
        }
    }
}

impl From<&TrainingConfig> for TrainerConfig {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            trees: config.trees,
            learning_rate: config.learning_rate,
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
            max_split_candidates: config.max_split_candidates,
        }
    }
}

pub struct GbdtTrainer {
    config: TrainerConfig,
}

impl GbdtTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Fit the ensemble on a feature matrix (NaN marks missing cells) and
    /// binary labels (0.0 or 1.0).
    pub fn fit(&self, features: &[Vec<f64>], labels: &[f64]) -> Result<GbdtModel> {
        if features.is_empty() {
            return Err(PipelineError::Training("empty training matrix".into()));
        }
        if features.len() != labels.len() {
            return Err(PipelineError::Training(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if labels.iter().any(|&y| y != 0.0 && y != 1.0) {
            return Err(PipelineError::Training("labels must be 0 or 1".into()));
        }

        let n_features = features[0].len();
        if features.iter().any(|row| row.len() != n_features) {
            return Err(PipelineError::Training("ragged feature matrix".into()));
        }

        // Initialize raw scores at the log-odds of the base rate.
        let positive = labels.iter().sum::<f64>() / labels.len() as f64;
        let base_rate = positive.clamp(1e-6, 1.0 - 1e-6);
        let bias = (base_rate / (1.0 - base_rate)).ln();
        let mut raw = vec![bias; labels.len()];

        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_leaf: self.config.min_samples_leaf,
            max_split_candidates: self.config.max_split_candidates,
            lambda: 1.0,
        };

        let mut trees = Vec::with_capacity(self.config.trees);
        for round in 0..self.config.trees {
            let mut gradients = Vec::with_capacity(labels.len());
            let mut hessians = Vec::with_capacity(labels.len());
            for (score, &y) in raw.iter().zip(labels) {
                let p = sigmoid(*score);
                gradients.push(p - y);
                hessians.push((p * (1.0 - p)).max(1e-16));
            }

            let tree = CartBuilder::new(features, &gradients, &hessians, params.clone()).build();
            for (score, row) in raw.iter_mut().zip(features) {
                *score += self.config.learning_rate * tree.evaluate(row);
            }

            debug!(round = round + 1, nodes = tree.nodes.len(), "boosting round done");
            trees.push(tree);
        }

        Ok(GbdtModel {
            bias,
            learning_rate: self.config.learning_rate,
            trees,
            n_features,
        })
    }
}
