//! Randomized search over boosted-stump hyperparameters.
//!
//! Exhaustive search over this space takes many more cycles without much
//! benefit, so a seeded sample of combinations is scored instead.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;

use crate::ml::gbdt::{GbdtFaceModel, GbdtParams, train_gbdt};

use super::{fraction_correct, subset_labels, subset_rows};

/// Discrete parameter space sampled by the randomized search.
#[derive(Debug, Clone)]
pub struct GbdtSearchSpace {
    /// Boosting rounds, fixed across candidates.
    pub rounds: usize,
    /// Learning rate, fixed across candidates.
    pub learning_rate: f64,
    /// Split-search bin count, fixed across candidates.
    pub bins: usize,
    pub min_leaf_weights: Vec<usize>,
    pub min_split_losses: Vec<f64>,
    pub subsamples: Vec<f64>,
    pub colsamples: Vec<f64>,
}

impl Default for GbdtSearchSpace {
    fn default() -> Self {
        Self {
            rounds: 600,
            learning_rate: 0.02,
            bins: 32,
            min_leaf_weights: vec![1, 5, 10],
            min_split_losses: vec![0.5, 1.0, 1.5, 2.0, 5.0],
            subsamples: vec![0.6, 0.8, 1.0],
            colsamples: vec![0.6, 0.8, 1.0],
        }
    }
}

impl GbdtSearchSpace {
    fn combinations(&self) -> usize {
        self.min_leaf_weights.len()
            * self.min_split_losses.len()
            * self.subsamples.len()
            * self.colsamples.len()
    }

    /// Decode a flat combination index into a parameter set.
    fn candidate(&self, mut index: usize, seed: u64) -> GbdtParams {
        let min_leaf_weight = self.min_leaf_weights[index % self.min_leaf_weights.len()];
        index /= self.min_leaf_weights.len();
        let min_split_loss = self.min_split_losses[index % self.min_split_losses.len()];
        index /= self.min_split_losses.len();
        let subsample = self.subsamples[index % self.subsamples.len()];
        index /= self.subsamples.len();
        let colsample = self.colsamples[index % self.colsamples.len()];

        GbdtParams {
            rounds: self.rounds,
            learning_rate: self.learning_rate,
            bins: self.bins,
            subsample,
            colsample,
            min_leaf_weight,
            min_split_loss,
            seed,
        }
    }

    /// Sample `n_iter` distinct combinations with a seeded RNG. Sampling is
    /// without replacement; a space smaller than `n_iter` yields the whole
    /// space.
    pub fn sample_candidates(&self, n_iter: usize, seed: u64) -> Vec<GbdtParams> {
        let total = self.combinations();
        let amount = n_iter.min(total);
        let mut rng = StdRng::seed_from_u64(seed);
        sample(&mut rng, total, amount)
            .into_vec()
            .into_iter()
            .map(|index| self.candidate(index, seed))
            .collect()
    }
}

/// Winning boosted-stump candidate, refit on the full training split.
#[derive(Debug, Clone)]
pub struct GbdtSearchOutcome {
    pub model: GbdtFaceModel,
    pub params: GbdtParams,
    /// Mean accuracy over the cross-validation folds.
    pub cv_accuracy: f64,
}

/// Score `n_iter` sampled candidates by cross-validated accuracy and refit
/// the best one on the full training split. Ties keep the earlier candidate.
pub fn find_best_gbdt(
    encodings: &[Vec<f64>],
    labels: &[usize],
    classes: &[String],
    folds: &[(Vec<usize>, Vec<usize>)],
    space: &GbdtSearchSpace,
    n_iter: usize,
    seed: u64,
) -> Result<GbdtSearchOutcome, String> {
    if n_iter == 0 {
        return Err("Randomized search needs at least one candidate".to_string());
    }
    if folds.is_empty() {
        return Err("No cross-validation folds".to_string());
    }

    let candidates = space.sample_candidates(n_iter, seed);
    if candidates.is_empty() {
        return Err("Boosted-stump search space is empty".to_string());
    }
    tracing::info!(
        candidates = candidates.len(),
        folds = folds.len(),
        "Finding best boosted-stump estimator"
    );

    let mut best: Option<(GbdtParams, f64)> = None;
    for params in &candidates {
        let cv_accuracy = cross_validate(encodings, labels, classes, folds, params)?;
        tracing::debug!(%params, cv_accuracy, "scored boosted-stump candidate");
        let improved = match best {
            Some((_, best_accuracy)) => cv_accuracy > best_accuracy,
            None => true,
        };
        if improved {
            best = Some((*params, cv_accuracy));
        }
    }

    let (params, cv_accuracy) =
        best.ok_or_else(|| "No boosted-stump candidate was scored".to_string())?;
    tracing::info!(%params, cv_accuracy, "best boosted-stump hyperparameters");

    let model = train_gbdt(encodings, labels, classes, &params)?;
    Ok(GbdtSearchOutcome {
        model,
        params,
        cv_accuracy,
    })
}

fn cross_validate(
    encodings: &[Vec<f64>],
    labels: &[usize],
    classes: &[String],
    folds: &[(Vec<usize>, Vec<usize>)],
    params: &GbdtParams,
) -> Result<f64, String> {
    let mut total = 0.0;
    for (train_idx, test_idx) in folds {
        let model = train_gbdt(
            &subset_rows(encodings, train_idx),
            &subset_labels(labels, train_idx),
            classes,
            params,
        )?;
        let predictions = model.predict(&subset_rows(encodings, test_idx));
        total += fraction_correct(&predictions, &subset_labels(labels, test_idx));
    }
    Ok(total / folds.len() as f64)
}
