//! Exhaustive grid search over SVM hyperparameters.

use crate::ml::svm::{Kernel, SvmFaceModel, SvmParams, train_one_vs_rest};

use super::{fraction_correct, subset_labels, subset_rows};

/// C values shared by both kernel families.
const CS: [f64; 6] = [0.001, 0.01, 0.1, 1.0, 10.0, 100.0];
/// Gamma values for the RBF kernel.
const GAMMAS: [f64; 6] = [0.001, 0.01, 0.1, 1.0, 10.0, 100.0];

/// The fixed SVM search grid: every C with a linear kernel, plus every
/// C × gamma combination with an RBF kernel.
pub fn default_svm_grid() -> Vec<SvmParams> {
    let mut grid = Vec::with_capacity(CS.len() + CS.len() * GAMMAS.len());
    for &c in &CS {
        grid.push(SvmParams {
            c,
            kernel: Kernel::Linear,
        });
    }
    for &c in &CS {
        for &gamma in &GAMMAS {
            grid.push(SvmParams {
                c,
                kernel: Kernel::Rbf { gamma },
            });
        }
    }
    grid
}

/// Winning SVM candidate, refit on the full training split.
#[derive(Debug, Clone)]
pub struct SvmSearchOutcome {
    pub model: SvmFaceModel,
    pub params: SvmParams,
    /// Mean accuracy over the cross-validation folds.
    pub cv_accuracy: f64,
}

/// Exhaustively score every candidate in `grid` by cross-validated accuracy
/// and refit the best one on the full training split.
///
/// A candidate that fails to train on some fold is skipped with a warning;
/// ties keep the earlier candidate, matching exhaustive-search convention.
pub fn find_best_svm(
    encodings: &[Vec<f64>],
    labels: &[usize],
    classes: &[String],
    folds: &[(Vec<usize>, Vec<usize>)],
    grid: &[SvmParams],
) -> Result<SvmSearchOutcome, String> {
    if grid.is_empty() {
        return Err("Empty SVM parameter grid".to_string());
    }
    if folds.is_empty() {
        return Err("No cross-validation folds".to_string());
    }

    tracing::info!(
        candidates = grid.len(),
        folds = folds.len(),
        "Finding best SVM estimator"
    );

    let mut best: Option<(SvmParams, f64)> = None;
    for params in grid {
        match cross_validate(encodings, labels, classes, folds, params) {
            Ok(cv_accuracy) => {
                tracing::debug!(%params, cv_accuracy, "scored SVM candidate");
                let improved = match best {
                    Some((_, best_accuracy)) => cv_accuracy > best_accuracy,
                    None => true,
                };
                if improved {
                    best = Some((*params, cv_accuracy));
                }
            }
            Err(err) => {
                tracing::warn!(%params, error = %err, "skipping SVM candidate");
            }
        }
    }

    let (params, cv_accuracy) =
        best.ok_or_else(|| "Every SVM candidate failed to train".to_string())?;
    tracing::info!(%params, cv_accuracy, "best SVM hyperparameters");

    let model = train_one_vs_rest(encodings, labels, classes, &params)?;
    Ok(SvmSearchOutcome {
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
    params: &SvmParams,
) -> Result<f64, String> {
    let mut total = 0.0;
    for (train_idx, test_idx) in folds {
        let model = train_one_vs_rest(
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StratifiedKFold;

    #[test]
    fn grid_has_42_candidates() {
        let grid = default_svm_grid();
        assert_eq!(grid.len(), 42);
        let linear = grid
            .iter()
            .filter(|p| matches!(p.kernel, Kernel::Linear))
            .count();
        assert_eq!(linear, 6);
    }

    fn clustered_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..10 {
            let jitter = (i as f64) * 0.05;
            x.push(vec![2.0 + jitter, 0.0]);
            y.push(0);
            x.push(vec![-2.0 - jitter, 0.2]);
            y.push(1);
        }
        (x, y, vec!["alice".to_string(), "bob".to_string()])
    }

    #[test]
    fn picks_a_candidate_that_separates() {
        let (x, y, classes) = clustered_data();
        let folds = StratifiedKFold::new(2).split(&y).unwrap();
        let grid = vec![
            SvmParams {
                c: 1.0,
                kernel: Kernel::Linear,
            },
            SvmParams {
                c: 10.0,
                kernel: Kernel::Rbf { gamma: 0.5 },
            },
        ];
        let outcome = find_best_svm(&x, &y, &classes, &folds, &grid).unwrap();
        assert!(outcome.cv_accuracy > 0.9, "cv={}", outcome.cv_accuracy);
        let predictions = outcome.model.predict(&x);
        assert!(fraction_correct(&predictions, &y) > 0.9);
    }

    #[test]
    fn empty_grid_is_an_error() {
        let (x, y, classes) = clustered_data();
        let folds = StratifiedKFold::new(2).split(&y).unwrap();
        assert!(find_best_svm(&x, &y, &classes, &folds, &[]).is_err());
    }
}
