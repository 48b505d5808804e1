//! Face-encoding dataset loading and splitting.

pub mod loader;
pub mod split;

pub use loader::{DatasetError, FaceDataset, load_encodings};
pub use split::{SplitError, StratifiedKFold, train_test_split};
