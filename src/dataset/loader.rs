//! Loader for serialized face-encoding datasets.
//!
//! The encodings file is produced by the face-encoding step: a single JSON
//! document holding parallel arrays of 128-d vectors and identity names.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ENCODING_DIM;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset is empty")]
    Empty,
    #[error("{encodings} encodings but {names} names")]
    LengthMismatch { encodings: usize, names: usize },
    #[error("encoding {index} has {got} values (expected {expected})")]
    BadDimension {
        index: usize,
        got: usize,
        expected: usize,
    },
    #[error("encoding {index} contains a non-finite value")]
    NonFinite { index: usize },
}

/// Known face encodings with their identity names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDataset {
    /// One fixed-length encoding vector per sample.
    pub encodings: Vec<Vec<f64>>,
    /// Identity name per sample, aligned with `encodings`.
    pub names: Vec<String>,
}

impl FaceDataset {
    /// Number of samples in the dataset.
    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    /// Check structural invariants: parallel lengths, fixed dimension,
    /// finite values.
    pub fn validate(&self, expected_dim: usize) -> Result<(), DatasetError> {
        if self.encodings.is_empty() {
            return Err(DatasetError::Empty);
        }
        if self.encodings.len() != self.names.len() {
            return Err(DatasetError::LengthMismatch {
                encodings: self.encodings.len(),
                names: self.names.len(),
            });
        }
        for (index, encoding) in self.encodings.iter().enumerate() {
            if encoding.len() != expected_dim {
                return Err(DatasetError::BadDimension {
                    index,
                    got: encoding.len(),
                    expected: expected_dim,
                });
            }
            if encoding.iter().any(|v| !v.is_finite()) {
                return Err(DatasetError::NonFinite { index });
            }
        }
        Ok(())
    }
}

/// Load and validate a face-encoding dataset from a JSON file.
pub fn load_encodings(path: &Path) -> Result<FaceDataset, DatasetError> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
    let dataset: FaceDataset = serde_json::from_slice(&bytes)?;
    dataset.validate(ENCODING_DIM)?;
    Ok(dataset)
}
