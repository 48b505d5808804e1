//! Gradient-boosted decision-stump ensemble for face classification.

pub mod model;
pub mod train;

pub use model::{GbdtFaceModel, Stump, softmax};
pub use train::{GbdtParams, train_gbdt};
