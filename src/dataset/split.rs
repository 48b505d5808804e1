//! Train/test splitting and stratified k-fold cross-validation indices.
//!
//! Both splitters operate on sample indices so callers can keep feature
//! storage untouched. All randomness is seeded for repeatable runs.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("test fraction {0} must be in (0, 1)")]
    BadTestFraction(f64),
    #[error("need at least 2 samples to split, got {0}")]
    TooFewSamples(usize),
    #[error("need at least 2 folds, got {0}")]
    TooFewFolds(usize),
    #[error("smallest class has {smallest} samples, fewer than {folds} folds")]
    ClassSmallerThanFolds { smallest: usize, folds: usize },
}

/// Shuffle `n` sample indices with a seeded RNG and split them into
/// (train, test) index sets.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), SplitError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::BadTestFraction(test_fraction));
    }
    if n < 2 {
        return Err(SplitError::TooFewSamples(n));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    // Keep both sides non-empty even for extreme fractions.
    let test_n = ((n as f64) * test_fraction).round() as usize;
    let test_n = test_n.clamp(1, n - 1);

    let test = indices[..test_n].to_vec();
    let train = indices[test_n..].to_vec();
    Ok((train, test))
}

/// Stratified k-fold cross-validator.
///
/// Deterministic (no shuffling): each class's samples are dealt to folds in
/// dataset order, so fold class proportions track the full set within
/// rounding.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    folds: usize,
}

impl StratifiedKFold {
    pub fn new(folds: usize) -> Self {
        Self { folds }
    }

    /// Produce `(train, test)` index pairs, one per fold.
    ///
    /// `labels` holds the class index of every sample; positions in the
    /// slice are the sample indices being partitioned.
    pub fn split(&self, labels: &[usize]) -> Result<Vec<(Vec<usize>, Vec<usize>)>, SplitError> {
        if self.folds < 2 {
            return Err(SplitError::TooFewFolds(self.folds));
        }

        let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, &label) in labels.iter().enumerate() {
            by_class.entry(label).or_default().push(index);
        }
        let smallest = by_class.values().map(|v| v.len()).min().unwrap_or(0);
        if smallest < self.folds {
            return Err(SplitError::ClassSmallerThanFolds {
                smallest,
                folds: self.folds,
            });
        }

        let mut test_folds: Vec<Vec<usize>> = vec![Vec::new(); self.folds];
        for indices in by_class.values() {
            let n = indices.len();
            let base = n / self.folds;
            let extra = n % self.folds;
            let mut cursor = 0usize;
            for (fold_idx, test_fold) in test_folds.iter_mut().enumerate() {
                let take = base + usize::from(fold_idx < extra);
                test_fold.extend_from_slice(&indices[cursor..cursor + take]);
                cursor += take;
            }
        }

        let mut out = Vec::with_capacity(self.folds);
        for fold_idx in 0..self.folds {
            let mut test = test_folds[fold_idx].clone();
            test.sort_unstable();
            let mut train = Vec::with_capacity(labels.len() - test.len());
            for (other_idx, fold) in test_folds.iter().enumerate() {
                if other_idx != fold_idx {
                    train.extend_from_slice(fold);
                }
            }
            train.sort_unstable();
            out.push((train, test));
        }
        Ok(out)
    }
}
