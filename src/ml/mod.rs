//! Classifier models, trainers and evaluation metrics.

pub mod gbdt;
pub mod metrics;
pub mod svm;
