//! One-vs-rest SVM training over `linfa-svm`.
//!
//! One binary machine is fit per class (this class vs. everything else);
//! its decision function is extracted into [`ClassClassifier`] form. Class
//! imbalance is handled by scaling the positive and negative penalty terms
//! inversely to class frequency.

use linfa::dataset::Dataset;
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::model::{ClassClassifier, SvmFaceModel};

/// SVM kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    Linear,
    /// Gaussian kernel `exp(-gamma·‖x - y‖²)`.
    Rbf { gamma: f64 },
}

/// Hyperparameters for a single SVM candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    /// Penalty term for misclassified samples.
    pub c: f64,
    pub kernel: Kernel,
}

impl std::fmt::Display for SvmParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kernel {
            Kernel::Linear => write!(f, "kernel=linear C={}", self.c),
            Kernel::Rbf { gamma } => write!(f, "kernel=rbf C={} gamma={}", self.c, gamma),
        }
    }
}

/// Train a one-vs-rest multiclass SVM.
///
/// `encodings` and `labels` are aligned; `labels` hold indices into
/// `classes`. Every class present in `classes` must have at least one
/// sample, otherwise its binary problem is degenerate.
pub fn train_one_vs_rest(
    encodings: &[Vec<f64>],
    labels: &[usize],
    classes: &[String],
    params: &SvmParams,
) -> Result<SvmFaceModel, String> {
    if encodings.len() != labels.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if encodings.is_empty() {
        return Err("Empty training set".to_string());
    }
    if classes.len() < 2 {
        return Err("Need at least 2 classes".to_string());
    }

    let n = encodings.len();
    let dim = encodings[0].len();
    if encodings.iter().any(|row| row.len() != dim) {
        return Err("Inconsistent encoding dimensions".to_string());
    }

    let mut flat = Vec::with_capacity(n * dim);
    for row in encodings {
        flat.extend_from_slice(row);
    }
    let records = Array2::from_shape_vec((n, dim), flat)
        .map_err(|err| format!("Failed to build encoding matrix: {err}"))?;

    let mut classifiers = Vec::with_capacity(classes.len());
    for class_idx in 0..classes.len() {
        let binary: Vec<bool> = labels.iter().map(|&label| label == class_idx).collect();
        let n_pos = binary.iter().filter(|&&b| b).count();
        let n_neg = n - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(format!(
                "Class {} has a degenerate binary problem ({n_pos} positive, {n_neg} negative)",
                classes[class_idx]
            ));
        }

        // Balanced class weighting: scale each side's penalty inversely to
        // its share of the training set.
        let c_pos = params.c * (n as f64) / (2.0 * n_pos as f64);
        let c_neg = params.c * (n as f64) / (2.0 * n_neg as f64);

        let dataset = Dataset::new(records.clone(), Array1::from_vec(binary));
        let fitted = match params.kernel {
            Kernel::Linear => Svm::<f64, bool>::params()
                .pos_neg_weights(c_pos, c_neg)
                .linear_kernel()
                .fit(&dataset),
            Kernel::Rbf { gamma } => Svm::<f64, bool>::params()
                .pos_neg_weights(c_pos, c_neg)
                // linfa parameterizes the gaussian kernel as exp(-d²/eps).
                .gaussian_kernel(1.0 / gamma)
                .fit(&dataset),
        }
        .map_err(|err| {
            format!(
                "SVM training failed for class {} ({params}): {err}",
                classes[class_idx]
            )
        })?;

        let alpha = fitted.alpha.clone();
        let rho = fitted.rho;
        let classifier = match params.kernel {
            Kernel::Linear => {
                // Collapse the dual form into a single weight vector:
                // w = Σ αᵢ·xᵢ.
                let mut weights = vec![0.0f64; dim];
                for (i, &alpha_i) in alpha.iter().enumerate() {
                    for (w, &x) in weights.iter_mut().zip(records.row(i).iter()) {
                        *w += alpha_i * x;
                    }
                }
                ClassClassifier::Linear { weights, rho }
            }
            Kernel::Rbf { gamma } => ClassClassifier::Rbf {
                alpha,
                support_vectors: encodings.to_vec(),
                gamma,
                rho,
            },
        };
        classifiers.push(classifier);
    }

    Ok(SvmFaceModel {
        model_version: 1,
        encoding_dim: dim,
        classes: classes.to_vec(),
        params: *params,
        classifiers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three well-separated clusters in 4-d.
    fn clustered_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let centers = [
            [4.0, 0.0, 0.0, 0.0],
            [0.0, 4.0, 0.0, 0.0],
            [0.0, 0.0, 4.0, 0.0],
        ];
        let offsets = [-0.3, -0.1, 0.0, 0.1, 0.3];
        let mut x = Vec::new();
        let mut y = Vec::new();
        for (class_idx, center) in centers.iter().enumerate() {
            for &da in &offsets {
                for &db in &offsets[..2] {
                    let mut row = center.to_vec();
                    row[0] += da;
                    row[3] += db;
                    x.push(row);
                    y.push(class_idx);
                }
            }
        }
        let classes = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
        (x, y, classes)
    }

    #[test]
    fn linear_ovr_separates_clusters() {
        let (x, y, classes) = clustered_data();
        let params = SvmParams {
            c: 1.0,
            kernel: Kernel::Linear,
        };
        let model = train_one_vs_rest(&x, &y, &classes, &params).unwrap();
        model.validate().unwrap();

        let predictions = model.predict(&x);
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        assert!(
            correct as f64 / y.len() as f64 > 0.95,
            "training accuracy too low: {correct}/{}",
            y.len()
        );
    }

    #[test]
    fn rbf_ovr_separates_clusters() {
        let (x, y, classes) = clustered_data();
        let params = SvmParams {
            c: 10.0,
            kernel: Kernel::Rbf { gamma: 0.1 },
        };
        let model = train_one_vs_rest(&x, &y, &classes, &params).unwrap();
        model.validate().unwrap();

        let predictions = model.predict(&x);
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        assert!(
            correct as f64 / y.len() as f64 > 0.9,
            "training accuracy too low: {correct}/{}",
            y.len()
        );
    }

    #[test]
    fn rejects_missing_class() {
        let (x, mut y, classes) = clustered_data();
        // Relabel carol's samples as bob: carol becomes degenerate.
        for label in &mut y {
            if *label == 2 {
                *label = 1;
            }
        }
        let params = SvmParams {
            c: 1.0,
            kernel: Kernel::Linear,
        };
        let err = train_one_vs_rest(&x, &y, &classes, &params).unwrap_err();
        assert!(err.contains("degenerate"));
    }

    #[test]
    fn rejects_ragged_rows() {
        let x = vec![vec![0.0, 1.0], vec![0.0]];
        let y = vec![0, 1];
        let classes = vec!["a".to_string(), "b".to_string()];
        let params = SvmParams {
            c: 1.0,
            kernel: Kernel::Linear,
        };
        assert!(train_one_vs_rest(&x, &y, &classes, &params).is_err());
    }
}
