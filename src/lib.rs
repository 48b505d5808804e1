//! Library exports for the face-classifier training pipeline.

/// Dataset loading and splitting.
pub mod dataset;
/// Label encoding between identity names and class indices.
pub mod labels;
/// Logging setup.
pub mod logging;
/// Classifier models, trainers and evaluation metrics.
pub mod ml;
/// Hyperparameter search over cross-validated candidates.
pub mod search;

/// Length of a face encoding vector.
pub const ENCODING_DIM: usize = 128;

/// Seed used for every random operation so runs are repeatable.
pub const RANDOM_SEED: u64 = 1234;

/// Number of folds for the stratified cross-validator.
pub const FOLDS: usize = 5;

/// Number of parameter combinations sampled by the randomized search.
pub const PARAM_COMB: usize = 20;

/// Fraction of samples held out for final evaluation.
pub const TEST_FRACTION: f64 = 0.20;
