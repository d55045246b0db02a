use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{validate_file_hash, validate_file_size};

/// A content-addressed file entry.
///
/// Keyed by the SHA-256 of the file bytes. `reference_count` tracks how many
/// dataset-version entries currently point at this hash; it never goes
/// below zero and files are never removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub hash: String,
    pub size: i64,
    #[serde(default)]
    pub reference_count: u64,
}

impl File {
    /// A fresh, unreferenced file entry.
    pub fn new(hash: impl Into<String>, size: i64) -> Self {
        Self {
            hash: hash.into(),
            size,
            reference_count: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_file_hash(&self.hash)?;
        validate_file_size(self.size)
    }

    /// Returns `true` if some live dataset version still references this file.
    pub fn is_referenced(&self) -> bool {
        self.reference_count > 0
    }
}
