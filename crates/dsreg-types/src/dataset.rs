use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{
    canonical_key_field, validate_change_log, validate_dataset_name, validate_file_hash,
    validate_file_name, validate_rows, validate_timestamp, validate_user_id,
};

/// A named reference to a stored [`File`](crate::File) inside a version or a
/// download record. Not stored on its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetFile {
    pub hash: String,
    #[serde(rename = "filename")]
    pub file_name: String,
}

impl DatasetFile {
    pub fn new(hash: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            file_name: file_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_file_name(&self.file_name)?;
        validate_file_hash(&self.hash)
    }
}

/// One immutable version of a dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default)]
    pub files: Vec<DatasetFile>,
    pub rows: i64,
    pub creation_time: String,
    #[serde(default)]
    pub change_log: String,
}

impl Version {
    /// Shape checks only; file existence is the ledger's job.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(self.files.len());
        for file in &self.files {
            file.validate()?;
            if !seen.insert(file.file_name.as_str()) {
                return Err(ValidationError::DuplicateFilename {
                    filename: file.file_name.clone(),
                });
            }
        }
        validate_rows(self.rows)?;
        validate_timestamp("creation time", &self.creation_time)?;
        validate_change_log(&self.change_log)
    }

    /// How many times each hash appears in this version.
    ///
    /// A hash listed under two filenames counts twice.
    pub fn file_occurrences(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            *counts.entry(file.hash.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Lifecycle of a dataset. `Deleted` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetState {
    Active,
    Deleted,
}

/// A versioned dataset owned by a user, keyed by `(owner, name)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub versions: Vec<Version>,
    #[serde(default)]
    pub deleted: bool,
}

impl Dataset {
    /// An active dataset with no versions.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_versions(owner, name, Vec::new())
    }

    pub fn with_versions(
        owner: impl Into<String>,
        name: impl Into<String>,
        versions: Vec<Version>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            versions,
            deleted: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id("owner id", &self.owner)?;
        validate_dataset_name(&self.name)?;
        for version in &self.versions {
            version.validate()?;
        }
        Ok(())
    }

    pub fn state(&self) -> DatasetState {
        if self.deleted {
            DatasetState::Deleted
        } else {
            DatasetState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == DatasetState::Active
    }

    /// Lowercase `(owner, name)` used in ledger keys.
    pub fn key_fields(&self) -> [String; 2] {
        [
            canonical_key_field(&self.owner),
            canonical_key_field(&self.name),
        ]
    }

    /// Hash occurrences summed over every version.
    pub fn file_occurrences(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for version in &self.versions {
            for (hash, n) in version.file_occurrences() {
                *counts.entry(hash).or_insert(0) += n;
            }
        }
        counts
    }
}
