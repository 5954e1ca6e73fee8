//! Regression tree builder.
//!
//! Exact-greedy CART construction over gradient/hessian pairs, with
//! deterministic tie-breaking (lowest feature index, then lowest threshold)
//! so the same data and parameters always produce the same tree. Missing
//! feature values (NaN) are routed to the left child at both build and
//! evaluation time.

use crate::model::gbdt::{Node, Tree};

/// Parameters for a single tree.
#[derive(Clone, Debug)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Cap on candidate thresholds per feature; larger cardinalities are
    /// thinned to evenly spaced candidates.
    pub max_split_candidates: usize,
    /// L2 regularization on leaf weights.
    pub lambda: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 20,
            max_split_candidates: 32,
            lambda: 1.0,
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Builds one regression tree from per-sample gradients and hessians.
pub struct CartBuilder<'a> {
    features: &'a [Vec<f64>],
    gradients: &'a [f64],
    hessians: &'a [f64],
    feature_count: usize,
    params: TreeParams,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        params: TreeParams,
    ) -> Self {
        assert_eq!(features.len(), gradients.len());
        assert_eq!(features.len(), hessians.len());
        let feature_count = features.first().map_or(0, Vec::len);
        Self {
            features,
            gradients,
            hessians,
            feature_count,
            params,
        }
    }

    pub fn build(&self) -> Tree {
        let indices: Vec<usize> = (0..self.features.len()).collect();
        let mut nodes = Vec::new();
        self.build_node(&indices, 0, &mut nodes);
        Tree { nodes }
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> u32 {
        let current = nodes.len() as u32;
        let leaf_value = self.leaf_value(indices);

        if depth >= self.params.max_depth || indices.len() < 2 * self.params.min_samples_leaf {
            nodes.push(Node::leaf(leaf_value));
            return current;
        }

        let Some(split) = self.find_best_split(indices) else {
            nodes.push(Node::leaf(leaf_value));
            return current;
        };

        let (left_indices, right_indices) = self.partition(indices, split.feature, split.threshold);
        if left_indices.len() < self.params.min_samples_leaf
            || right_indices.len() < self.params.min_samples_leaf
        {
            nodes.push(Node::leaf(leaf_value));
            return current;
        }

        nodes.push(Node::split(split.feature as u32, split.threshold));
        let left = self.build_node(&left_indices, depth + 1, nodes);
        let right = self.build_node(&right_indices, depth + 1, nodes);
        nodes[current as usize].left = left;
        nodes[current as usize].right = right;
        current
    }

    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let (g_parent, h_parent) = self.sums(indices);
        let parent_score = score(g_parent, h_parent, self.params.lambda);

        let mut best: Option<SplitCandidate> = None;
        for feature in 0..self.feature_count {
            for threshold in self.candidate_thresholds(indices, feature) {
                let (left, right) = self.partition(indices, feature, threshold);
                if left.len() < self.params.min_samples_leaf
                    || right.len() < self.params.min_samples_leaf
                {
                    continue;
                }

                let (g_left, h_left) = self.sums(&left);
                let (g_right, h_right) = self.sums(&right);
                let gain = score(g_left, h_left, self.params.lambda)
                    + score(g_right, h_right, self.params.lambda)
                    - parent_score;

                // Strict improvement only; ties keep the earliest candidate,
                // which is what makes the builder deterministic.
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }

    /// Distinct non-missing values of a feature, thinned to at most
    /// `max_split_candidates` evenly spaced thresholds. The maximum value is
    /// dropped: splitting there sends every sample left.
    fn candidate_thresholds(&self, indices: &[usize], feature: usize) -> Vec<f64> {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&i| self.features[i][feature])
            .filter(|v| !v.is_nan())
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values.dedup();
        if values.len() < 2 {
            return Vec::new();
        }
        values.pop();

        if values.len() <= self.params.max_split_candidates {
            return values;
        }
        let step = values.len() as f64 / self.params.max_split_candidates as f64;
        (0..self.params.max_split_candidates)
            .map(|i| values[(i as f64 * step) as usize])
            .collect()
    }

    fn partition(&self, indices: &[usize], feature: usize, threshold: f64) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &i in indices {
            let v = self.features[i][feature];
            if v.is_nan() || v <= threshold {
                left.push(i);
            } else {
                right.push(i);
            }
        }
        (left, right)
    }

    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        let mut g = 0.0;
        let mut h = 0.0;
        for &i in indices {
            g += self.gradients[i];
            h += self.hessians[i];
        }
        (g, h)
    }

    /// Optimal leaf weight: -G / (H + lambda).
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let (g, h) = self.sums(indices);
        -g / (h + self.params.lambda)
    }
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    (g * g) / (h + lambda)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: 3,
            min_samples_leaf: 1,
            max_split_candidates: 32,
            lambda: 0.0,
        }
    }

    #[test]
    fn test_splits_separable_gradients() {
        let features = vec![vec![1.0], vec![2.0], vec![10.0], vec![11.0]];
        let gradients = vec![-1.0, -1.0, 1.0, 1.0];
        let hessians = vec![1.0; 4];

        let tree = CartBuilder::new(&features, &gradients, &hessians, params()).build();

        // Left side (low values) should get a positive correction, right a
        // negative one.
        assert!(tree.evaluate(&[1.5]) > 0.0);
        assert!(tree.evaluate(&[10.5]) < 0.0);
    }

    #[test]
    fn test_single_value_feature_yields_leaf() {
        let features = vec![vec![5.0], vec![5.0], vec![5.0]];
        let gradients = vec![1.0, 2.0, 3.0];
        let hessians = vec![1.0; 3];

        let tree = CartBuilder::new(&features, &gradients, &hessians, params()).build();
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.nodes[0].leaf.is_some());
    }

    #[test]
    fn test_missing_values_go_left() {
        let features = vec![vec![1.0], vec![2.0], vec![10.0], vec![11.0]];
        let gradients = vec![-1.0, -1.0, 1.0, 1.0];
        let hessians = vec![1.0; 4];

        let tree = CartBuilder::new(&features, &gradients, &hessians, params()).build();
        assert_eq!(tree.evaluate(&[f64::NAN]), tree.evaluate(&[1.0]));
    }

    #[test]
    fn test_deterministic_build() {
        let features = vec![vec![3.0, 1.0], vec![1.0, 3.0], vec![2.0, 2.0], vec![4.0, 0.0]];
        let gradients = vec![-1.0, 1.0, -0.5, 0.5];
        let hessians = vec![1.0; 4];

        let a = CartBuilder::new(&features, &gradients, &hessians, params()).build();
        let b = CartBuilder::new(&features, &gradients, &hessians, params()).build();
        assert_eq!(a.nodes.len(), b.nodes.len());
        for (na, nb) in a.nodes.iter().zip(&b.nodes) {
            assert_eq!(na.feature, nb.feature);
            assert_eq!(na.threshold, nb.threshold);
            assert_eq!(na.leaf, nb.leaf);
        }
    }
}
