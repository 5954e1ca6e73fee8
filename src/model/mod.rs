//! Model layer: the frozen feature schema, the scorer contract, and the
//! gradient-boosted tree implementation behind it.

pub mod cart;
pub mod gbdt;
pub mod trainer;

pub use gbdt::GbdtModel;
pub use trainer::{GbdtTrainer, TrainerConfig};

use serde::{Deserialize, Serialize};

/// The ordered list of feature columns the scorer was fit on.
///
/// Every inference input must be transformed into a row with exactly these
/// columns, in exactly this order, before scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSchema {
    columns: Vec<String>,
}

impl ModelSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Opaque binary classifier contract: per-row probability of the positive
/// class. Any probabilistic classifier satisfying this is substitutable.
pub trait Scorer {
    /// Probability of the positive class for each input row. Rows use
    /// `f64::NAN` for missing values.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<f64>;

    /// Convenience for the single-row inference path.
    fn predict_proba_one(&self, row: &[f64]) -> f64 {
        self.predict_proba(&[row.to_vec()])[0]
    }
}
