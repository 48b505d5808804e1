//! Evaluation metrics for classification models.

use std::fmt::Write as _;

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Build a matrix from aligned truth/prediction slices.
    pub fn from_predictions(truths: &[usize], predictions: &[usize], n_classes: usize) -> Self {
        let mut cm = Self::new(n_classes);
        for (&truth, &predicted) in truths.iter().zip(predictions.iter()) {
            cm.add(truth, predicted);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Render the matrix as aligned columns (rows = truth, cols = predicted).
    pub fn render(&self) -> String {
        let mut out = String::from("confusion matrix (rows=true, cols=pred):\n");
        for truth in 0..self.n_classes {
            for predicted in 0..self.n_classes {
                let _ = write!(out, "{:6}", self.get(truth, predicted));
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision, recall and F1 from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f64;
        let mut fp = 0f64;
        let mut fn_ = 0f64;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f64;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f64;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        stats.push(PerClassStats {
            precision,
            recall,
            f1,
            support,
        });
    }
    stats
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let mut correct = 0u64;
    let mut total = 0u64;
    for truth in 0..cm.n_classes {
        for predicted in 0..cm.n_classes {
            let v = cm.get(truth, predicted) as u64;
            total += v;
            if truth == predicted {
                correct += v;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        (correct as f64) / (total as f64)
    }
}

/// Render a per-class precision/recall/F1 report with macro and weighted
/// averages, keyed by decoded class names.
pub fn classification_report(cm: &ConfusionMatrix, class_names: &[String]) -> String {
    let stats = precision_recall_by_class(cm);
    let name_width = class_names
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0)
        .max("weighted avg".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>name_width$}  precision  recall  f1-score  support",
        ""
    );
    for (class_idx, per_class) in stats.iter().enumerate() {
        let name = class_names
            .get(class_idx)
            .map(String::as_str)
            .unwrap_or("?");
        let _ = writeln!(
            out,
            "{name:>name_width$}      {:.3}   {:.3}     {:.3}  {:7}",
            per_class.precision, per_class.recall, per_class.f1, per_class.support
        );
    }

    let total: u32 = stats.iter().map(|s| s.support).sum();
    let k = stats.len().max(1) as f64;
    let macro_p = stats.iter().map(|s| s.precision).sum::<f64>() / k;
    let macro_r = stats.iter().map(|s| s.recall).sum::<f64>() / k;
    let macro_f = stats.iter().map(|s| s.f1).sum::<f64>() / k;
    let weight = |value: f64, support: u32| value * support as f64 / total.max(1) as f64;
    let weighted_p: f64 = stats.iter().map(|s| weight(s.precision, s.support)).sum();
    let weighted_r: f64 = stats.iter().map(|s| weight(s.recall, s.support)).sum();
    let weighted_f: f64 = stats.iter().map(|s| weight(s.f1, s.support)).sum();

    let _ = writeln!(
        out,
        "{:>name_width$}      {:.3}   {:.3}     {:.3}  {total:7}",
        "macro avg", macro_p, macro_r, macro_f
    );
    let _ = writeln!(
        out,
        "{:>name_width$}      {:.3}   {:.3}     {:.3}  {total:7}",
        "weighted avg", weighted_p, weighted_r, weighted_f
    );
    let _ = writeln!(out, "{:>name_width$}  {:.4}", "accuracy", accuracy(cm));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_class_matrix() -> ConfusionMatrix {
        // truth 0: 8 correct, 2 predicted as 1
        // truth 1: 1 predicted as 0, 9 correct
        ConfusionMatrix::from_predictions(
            &[vec![0usize; 10], vec![1usize; 10]].concat(),
            &[
                vec![0usize; 8],
                vec![1usize; 2],
                vec![0usize; 1],
                vec![1usize; 9],
            ]
            .concat(),
            2,
        )
    }

    #[test]
    fn accuracy_counts_diagonal() {
        let cm = two_class_matrix();
        assert!((accuracy(&cm) - 0.85).abs() < 1e-9);
    }

    #[test]
    fn per_class_precision_recall() {
        let cm = two_class_matrix();
        let stats = precision_recall_by_class(&cm);
        assert_eq!(stats[0].support, 10);
        assert!((stats[0].precision - 8.0 / 9.0).abs() < 1e-9);
        assert!((stats[0].recall - 0.8).abs() < 1e-9);
        assert!((stats[1].precision - 9.0 / 11.0).abs() < 1e-9);
        assert!((stats[1].recall - 0.9).abs() < 1e-9);
        let f1 = 2.0 * (8.0 / 9.0) * 0.8 / (8.0 / 9.0 + 0.8);
        assert!((stats[0].f1 - f1).abs() < 1e-9);
    }

    #[test]
    fn report_lists_class_names_and_averages() {
        let cm = two_class_matrix();
        let report =
            classification_report(&cm, &["alice".to_string(), "bob".to_string()]);
        assert!(report.contains("alice"));
        assert!(report.contains("bob"));
        assert!(report.contains("macro avg"));
        assert!(report.contains("weighted avg"));
        assert!(report.contains("0.8500"));
    }

    #[test]
    fn out_of_range_predictions_are_ignored() {
        let mut cm = ConfusionMatrix::new(2);
        cm.add(0, 5);
        cm.add(7, 1);
        assert_eq!(cm.counts.iter().sum::<u32>(), 0);
    }
}
