//! One-vs-rest multiclass SVM over `linfa-svm` binary machines.

pub mod model;
pub mod train;

pub use model::{ClassClassifier, SvmFaceModel};
pub use train::{Kernel, SvmParams, train_one_vs_rest};
