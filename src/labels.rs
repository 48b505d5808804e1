//! Bijective mapping between identity names and contiguous class indices.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("cannot fit a label encoder on an empty label set")]
    Empty,
    #[error("unknown label: {0}")]
    UnknownLabel(String),
    #[error("class index {index} out of range ({classes} classes)")]
    IndexOutOfRange { index: usize, classes: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Label encoder fit once on the full label set.
///
/// Classes are stored sorted and deduplicated so the index assignment is
/// deterministic for a given label set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit the encoder over every label in the dataset.
    pub fn fit(names: &[String]) -> Result<Self, LabelError> {
        if names.is_empty() {
            return Err(LabelError::Empty);
        }
        let classes: Vec<String> = names
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Ok(Self { classes })
    }

    /// Ordered class names; the position of a name is its class index.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Map labels to class indices. Labels not seen during `fit` are errors.
    pub fn transform(&self, names: &[String]) -> Result<Vec<usize>, LabelError> {
        names
            .iter()
            .map(|name| {
                self.classes
                    .binary_search(name)
                    .map_err(|_| LabelError::UnknownLabel(name.clone()))
            })
            .collect()
    }

    /// Map class indices back to identity names.
    pub fn inverse_transform(&self, indices: &[usize]) -> Result<Vec<String>, LabelError> {
        indices
            .iter()
            .map(|&index| {
                self.classes
                    .get(index)
                    .cloned()
                    .ok_or(LabelError::IndexOutOfRange {
                        index,
                        classes: self.classes.len(),
                    })
            })
            .collect()
    }

    /// Write the encoder to a JSON file, creating parent directories.
    pub fn save_json(&self, path: &Path) -> Result<(), LabelError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load an encoder from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, LabelError> {
        let bytes = std::fs::read(path)?;
        let encoder: Self = serde_json::from_slice(&bytes)?;
        if encoder.classes.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(encoder)
    }
}
