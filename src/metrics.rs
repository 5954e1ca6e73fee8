//! Evaluation metrics for the binary default classifier.

/// Area under the ROC curve via the rank-sum statistic, with average ranks
/// for tied scores. `None` when one of the classes is absent.
pub fn roc_auc(labels: &[f64], scores: &[f64]) -> Option<f64> {
    assert_eq!(labels.len(), scores.len());
    let positives = labels.iter().filter(|&&y| y == 1.0).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap());

    // Average ranks across ties (1-based).
    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let rank = (i + 1 + j + 1) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(&y, _)| y == 1.0)
        .map(|(_, &r)| r)
        .sum();

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Confusion counts at a probability threshold. A row is predicted positive
/// iff its probability is strictly greater than the threshold, matching the
/// service decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    pub fn at_threshold(labels: &[f64], probabilities: &[f64], threshold: f64) -> Self {
        assert_eq!(labels.len(), probabilities.len());
        let mut m = Self {
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_positives: 0,
        };
        for (&y, &p) in labels.iter().zip(probabilities) {
            let predicted = p > threshold;
            match (y == 1.0, predicted) {
                (false, false) => m.true_negatives += 1,
                (false, true) => m.false_positives += 1,
                (true, false) => m.false_negatives += 1,
                (true, true) => m.true_positives += 1,
            }
        }
        m
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.true_negatives + self.false_positives + self.false_negatives + self.true_positives;
        (self.true_negatives + self.true_positives) as f64 / total as f64
    }

    fn precision_recall_f1(tp: usize, fp: usize, fn_: usize) -> (f64, f64, f64) {
        let precision = if tp + fp > 0 { tp as f64 / (tp + fp) as f64 } else { 0.0 };
        let recall = if tp + fn_ > 0 { tp as f64 / (tp + fn_) as f64 } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        (precision, recall, f1)
    }

    /// Plain-text per-class report (precision / recall / F1 / support).
    pub fn classification_report(&self) -> String {
        let (p1, r1, f1) = Self::precision_recall_f1(
            self.true_positives,
            self.false_positives,
            self.false_negatives,
        );
        let (p0, r0, f0) = Self::precision_recall_f1(
            self.true_negatives,
            self.false_negatives,
            self.false_positives,
        );
        let support0 = self.true_negatives + self.false_positives;
        let support1 = self.true_positives + self.false_negatives;

        let mut out = String::new();
        out.push_str("class      precision    recall  f1-score   support\n");
        out.push_str(&format!(
            "0 (paga)     {p0:>7.4}   {r0:>7.4}   {f0:>7.4}   {support0:>7}\n"
        ));
        out.push_str(&format!(
            "1 (default)  {p1:>7.4}   {r1:>7.4}   {f1:>7.4}   {support1:>7}\n"
        ));
        out.push_str(&format!("accuracy     {:>7.4}\n", self.accuracy()));
        out
    }
}
