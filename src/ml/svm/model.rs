//! Serialized form of a trained one-vs-rest SVM.
//!
//! Each class carries a self-contained binary decision function extracted
//! from the fitted `linfa-svm` machine, so loading a model needs nothing
//! beyond this crate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::train::SvmParams;

/// Per-class binary decision function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassClassifier {
    /// `f(x) = w·x - rho`.
    Linear { weights: Vec<f64>, rho: f64 },
    /// `f(x) = Σ αᵢ·exp(-γ‖x - xᵢ‖²) - rho`.
    Rbf {
        alpha: Vec<f64>,
        support_vectors: Vec<Vec<f64>>,
        gamma: f64,
        rho: f64,
    },
}

impl ClassClassifier {
    /// Signed distance from the separating boundary; positive means the
    /// probe belongs to this classifier's class.
    pub fn decision_function(&self, encoding: &[f64]) -> f64 {
        match self {
            ClassClassifier::Linear { weights, rho } => {
                let dot: f64 = weights
                    .iter()
                    .zip(encoding.iter())
                    .map(|(w, x)| w * x)
                    .sum();
                dot - rho
            }
            ClassClassifier::Rbf {
                alpha,
                support_vectors,
                gamma,
                rho,
            } => {
                let mut sum = 0.0;
                for (alpha_i, sv) in alpha.iter().zip(support_vectors.iter()) {
                    let sq_dist: f64 = sv
                        .iter()
                        .zip(encoding.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    sum += alpha_i * (-gamma * sq_dist).exp();
                }
                sum - rho
            }
        }
    }
}

/// Trained one-vs-rest SVM face classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmFaceModel {
    /// Model format version.
    pub model_version: i64,
    /// Encoding length expected by this model.
    pub encoding_dim: usize,
    /// Ordered list of identity names; position = class index.
    pub classes: Vec<String>,
    /// Hyperparameters the model was trained with.
    pub params: SvmParams,
    /// One binary classifier per class, aligned with `classes`.
    pub classifiers: Vec<ClassClassifier>,
}

impl SvmFaceModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.classifiers.len() != self.classes.len() {
            return Err(format!(
                "{} classifiers but {} classes",
                self.classifiers.len(),
                self.classes.len()
            ));
        }
        for (class_idx, classifier) in self.classifiers.iter().enumerate() {
            match classifier {
                ClassClassifier::Linear { weights, .. } => {
                    if weights.len() != self.encoding_dim {
                        return Err(format!(
                            "Class {class_idx} weight vector has {} values, expected {}",
                            weights.len(),
                            self.encoding_dim
                        ));
                    }
                }
                ClassClassifier::Rbf {
                    alpha,
                    support_vectors,
                    ..
                } => {
                    if alpha.len() != support_vectors.len() {
                        return Err(format!(
                            "Class {class_idx} has {} alphas but {} support vectors",
                            alpha.len(),
                            support_vectors.len()
                        ));
                    }
                    if support_vectors
                        .iter()
                        .any(|sv| sv.len() != self.encoding_dim)
                    {
                        return Err(format!(
                            "Class {class_idx} has a support vector of the wrong dimension"
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Per-class decision values for a probe encoding.
    pub fn decision_values(&self, encoding: &[f64]) -> Vec<f64> {
        self.classifiers
            .iter()
            .map(|c| c.decision_function(encoding))
            .collect()
    }

    /// Predict the best class index for a probe encoding.
    pub fn predict_class_index(&self, encoding: &[f64]) -> usize {
        let values = self.decision_values(encoding);
        let mut best_idx = 0usize;
        let mut best_val = f64::NEG_INFINITY;
        for (idx, v) in values.into_iter().enumerate() {
            if v > best_val {
                best_val = v;
                best_idx = idx;
            }
        }
        best_idx
    }

    /// Predict class indices for a batch of encodings.
    pub fn predict(&self, encodings: &[Vec<f64>]) -> Vec<usize> {
        encodings
            .iter()
            .map(|e| self.predict_class_index(e))
            .collect()
    }

    /// Write the model to a JSON file, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        let bytes = serde_json::to_vec_pretty(self).map_err(|err| err.to_string())?;
        std::fs::write(path, bytes).map_err(|err| err.to_string())
    }

    /// Load a model from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|err| err.to_string())?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|err| err.to_string())?;
        model.validate()?;
        Ok(model)
    }
}
