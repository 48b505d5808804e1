//! Hyperparameter selection scored by stratified cross-validation.
//!
//! Candidates are evaluated sequentially: train on each fold's training
//! indices, score accuracy on the fold's test indices, average across
//! folds, keep the best candidate and refit it on the full training split.

pub mod grid;
pub mod random;

pub use grid::{SvmSearchOutcome, default_svm_grid, find_best_svm};
pub use random::{GbdtSearchOutcome, GbdtSearchSpace, find_best_gbdt};

/// Gather the rows of `x` named by `indices`.
pub(crate) fn subset_rows(x: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    indices.iter().map(|&i| x[i].clone()).collect()
}

/// Gather the labels named by `indices`.
pub(crate) fn subset_labels(y: &[usize], indices: &[usize]) -> Vec<usize> {
    indices.iter().map(|&i| y[i]).collect()
}

/// Fraction of predictions matching the truth.
pub(crate) fn fraction_correct(predictions: &[usize], truths: &[usize]) -> f64 {
    if truths.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(truths.iter())
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / truths.len() as f64
}
