//! Gradient-boosted tree model.
//!
//! The persisted scorer state: an additive ensemble of regression trees over
//! the encoded feature row, combined through a sigmoid link into a default
//! probability.

use crate::model::Scorer;
use serde::{Deserialize, Serialize};

/// One tree node. Interior nodes route on `feature <= threshold` (missing
/// values go left); leaves carry the additive weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub feature: u32,
    pub threshold: f64,
    pub left: u32,
    pub right: u32,
    pub leaf: Option<f64>,
}

impl Node {
    pub fn leaf(value: f64) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            leaf: Some(value),
        }
    }

    pub fn split(feature: u32, threshold: f64) -> Self {
        Self {
            feature,
            threshold,
            left: 0,
            right: 0,
            leaf: None,
        }
    }
}

/// A single regression tree stored as a flat node array, root at index 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk the tree for one feature row. Missing (NaN) values take the left
    /// branch.
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };
            if let Some(value) = node.leaf {
                return value;
            }
            let v = row.get(node.feature as usize).copied().unwrap_or(f64::NAN);
            idx = if v.is_nan() || v <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }
}

/// Trained GBDT classifier state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtModel {
    /// Log-odds of the training base rate.
    pub bias: f64,
    /// Shrinkage applied to each tree's contribution.
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
    /// Width of the feature rows the model was fit on.
    pub n_features: usize,
}

impl GbdtModel {
    /// Raw additive score (log-odds) for one row.
    pub fn raw_score(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(row)).sum();
        self.bias + self.learning_rate * sum
    }
}

impl Scorer for GbdtModel {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| sigmoid(self.raw_score(row))).collect()
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: u32, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                Node {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                    leaf: None,
                },
                Node::leaf(left),
                Node::leaf(right),
            ],
        }
    }

    #[test]
    fn test_tree_routing() {
        let tree = stump(0, 5.0, -1.0, 1.0);
        assert_eq!(tree.evaluate(&[3.0]), -1.0);
        assert_eq!(tree.evaluate(&[5.0]), -1.0);
        assert_eq!(tree.evaluate(&[7.0]), 1.0);
        // Missing goes left.
        assert_eq!(tree.evaluate(&[f64::NAN]), -1.0);
    }

    #[test]
    fn test_probabilities_bounded() {
        let model = GbdtModel {
            bias: 0.0,
            learning_rate: 0.5,
            trees: vec![stump(0, 0.0, -10.0, 10.0)],
            n_features: 1,
        };

        let probs = model.predict_proba(&[vec![-1.0], vec![1.0]]);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(probs[0] < 0.5);
        assert!(probs[1] > 0.5);
    }

    #[test]
    fn test_empty_ensemble_is_base_rate() {
        let model = GbdtModel {
            bias: 0.0,
            learning_rate: 0.1,
            trees: Vec::new(),
            n_features: 3,
        };
        assert_eq!(model.predict_proba(&[vec![1.0, 2.0, 3.0]]), vec![0.5]);
    }

    #[test]
    fn test_serialization_round_trip() {
        let model = GbdtModel {
            bias: -1.2,
            learning_rate: 0.05,
            trees: vec![stump(2, 0.5, -0.3, 0.4)],
            n_features: 5,
        };
        let json = serde_json::to_string(&model).unwrap();
        let restored: GbdtModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, restored);
    }
}
