//! Seeded, label-stratified train/test split.
//!
//! Training and independent evaluation both derive their test partition from
//! this function with the seed and fraction taken from configuration; using
//! different values across stages makes their metrics incomparable.

use crate::error::{PipelineError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of the two partitions, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows into train/test, preserving the label ratio in both partitions.
pub fn stratified_split(labels: &[f64], test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    if labels.is_empty() {
        return Err(PipelineError::Training("cannot split zero rows".into()));
    }
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(PipelineError::Training(format!(
            "test fraction {test_fraction} outside (0, 1)"
        )));
    }
    if labels.iter().any(|&y| y != 0.0 && y != 1.0) {
        return Err(PipelineError::Training("labels must be 0 or 1".into()));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    // Strata in fixed order so the RNG consumption is reproducible.
    for class in [0.0, 1.0] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &y)| y == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);

        let test_count = (indices.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&indices[..test_count]);
        train.extend_from_slice(&indices[test_count..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<f64> {
        // 80 negatives, 20 positives.
        let mut y = vec![0.0; 80];
        y.extend(vec![1.0; 20]);
        y
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let y = labels();
        let split = stratified_split(&y, 0.2, 42).unwrap();

        assert_eq!(split.train.len() + split.test.len(), y.len());
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..y.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratification_preserves_class_ratio() {
        let y = labels();
        let split = stratified_split(&y, 0.2, 42).unwrap();

        let test_positives = split.test.iter().filter(|&&i| y[i] == 1.0).count();
        let train_positives = split.train.iter().filter(|&&i| y[i] == 1.0).count();
        // Exactly 20% of each stratum lands in the test set.
        assert_eq!(split.test.len(), 20);
        assert_eq!(test_positives, 4);
        assert_eq!(train_positives, 16);
    }

    #[test]
    fn test_same_seed_same_split() {
        let y = labels();
        assert_eq!(
            stratified_split(&y, 0.2, 42).unwrap(),
            stratified_split(&y, 0.2, 42).unwrap()
        );
    }

    #[test]
    fn test_different_seed_different_split() {
        let y = labels();
        assert_ne!(
            stratified_split(&y, 0.2, 42).unwrap(),
            stratified_split(&y, 0.2, 7).unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_fraction() {
        assert!(stratified_split(&[0.0, 1.0], 0.0, 1).is_err());
        assert!(stratified_split(&[0.0, 1.0], 1.0, 1).is_err());
    }
}
