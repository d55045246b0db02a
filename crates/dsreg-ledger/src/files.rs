//! Reference-counted, content-addressed file store.
//!
//! A file is keyed by the SHA-256 of its bytes and carries a count of how
//! many live dataset-version entries list it. Counts are adjusted with
//! read-modify-write of the single file value; a decrement below zero is a
//! referential-integrity failure and is never clamped.

use std::collections::BTreeMap;
use std::sync::Arc;

use dsreg_store::KeyValueLedger;
use dsreg_types::validation::validate_file_hash;
use dsreg_types::File;
use tracing::{debug, info};

use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::schema::{file_key, Schema};

/// A file whose count has been adjusted but not written, with the count it
/// was read with.
#[derive(Debug)]
pub(crate) struct StagedFile {
    pub(crate) read_count: u64,
    pub(crate) file: File,
}

pub struct FileStore<L: ?Sized> {
    schema: Schema<L>,
}

impl<L: KeyValueLedger + ?Sized> FileStore<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::from_schema(Schema::new(ledger))
    }

    pub(crate) fn from_schema(schema: Schema<L>) -> Self {
        Self { schema }
    }

    /// Register a file with a reference count of zero.
    pub fn create_file(&self, hash: &str, size: i64) -> LedgerResult<File> {
        let file = File::new(hash, size);
        file.validate()?;

        let key = file_key(hash);
        if self.schema.files.exists(&key)? {
            return Err(LedgerError::already_exists(EntityKind::File, hash));
        }
        self.schema.files.put(&file, &key)?;
        info!(hash = %hash, size, "file created");
        Ok(file)
    }

    pub fn query_file(&self, hash: &str) -> LedgerResult<File> {
        validate_file_hash(hash)?;
        self.get(hash)?
            .ok_or_else(|| LedgerError::not_found(EntityKind::File, hash))
    }

    /// Fetch every listed file, in argument order. Fails as a whole if any
    /// hash is malformed or missing.
    pub fn query_files<S: AsRef<str>>(&self, hashes: &[S]) -> LedgerResult<Vec<File>> {
        for hash in hashes {
            validate_file_hash(hash.as_ref())?;
        }
        hashes
            .iter()
            .map(|hash| {
                let hash = hash.as_ref();
                self.get(hash)?
                    .ok_or_else(|| LedgerError::not_found(EntityKind::File, hash))
            })
            .collect()
    }

    pub fn file_exists(&self, hash: &str) -> LedgerResult<bool> {
        validate_file_hash(hash)?;
        Ok(self.schema.files.exists(&file_key(hash))?)
    }

    pub fn increment_reference_count(&self, hash: &str) -> LedgerResult<File> {
        validate_file_hash(hash)?;
        let staged = self.stage_increments(&BTreeMap::from([(hash.to_string(), 1)]))?;
        self.put_adjusted(staged)
    }

    /// Fails with [`LedgerError::ReferentialIntegrity`] if the count is
    /// already zero, and with `NotFound` if the file does not exist.
    pub fn decrement_reference_count(&self, hash: &str) -> LedgerResult<File> {
        validate_file_hash(hash)?;
        if !self.schema.files.exists(&file_key(hash))? {
            return Err(LedgerError::not_found(EntityKind::File, hash));
        }
        let staged = self.stage_decrements(&BTreeMap::from([(hash.to_string(), 1)]))?;
        self.put_adjusted(staged)
    }

    // -----------------------------------------------------------------------
    // Staging
    // -----------------------------------------------------------------------

    /// Read every file in `occurrences` and return it with its count raised
    /// by the occurrence number. Missing files are `NotFound`.
    pub(crate) fn stage_increments(
        &self,
        occurrences: &BTreeMap<String, u64>,
    ) -> LedgerResult<Vec<StagedFile>> {
        let mut staged = Vec::with_capacity(occurrences.len());
        for (hash, n) in occurrences {
            let mut file = self
                .get(hash)?
                .ok_or_else(|| LedgerError::not_found(EntityKind::File, hash.as_str()))?;
            let read_count = file.reference_count;
            file.reference_count = file.reference_count.checked_add(*n).ok_or_else(|| {
                LedgerError::ReferentialIntegrity(format!(
                    "reference count of {hash} would overflow"
                ))
            })?;
            debug!(hash = %hash, by = n, to = file.reference_count, "staged increment");
            staged.push(StagedFile { read_count, file });
        }
        Ok(staged)
    }

    /// Read every file in `occurrences` and return it with its count lowered
    /// by the occurrence number. A file that vanished, or whose count is too
    /// small, is a referential-integrity failure.
    pub(crate) fn stage_decrements(
        &self,
        occurrences: &BTreeMap<String, u64>,
    ) -> LedgerResult<Vec<StagedFile>> {
        let mut staged = Vec::with_capacity(occurrences.len());
        for (hash, n) in occurrences {
            let mut file = self.get(hash)?.ok_or_else(|| {
                LedgerError::ReferentialIntegrity(format!("referenced file {hash} is missing"))
            })?;
            let read_count = file.reference_count;
            file.reference_count = file.reference_count.checked_sub(*n).ok_or_else(|| {
                LedgerError::ReferentialIntegrity(format!(
                    "reference count of {hash} is {} and cannot drop by {n}",
                    file.reference_count
                ))
            })?;
            debug!(hash = %hash, by = n, to = file.reference_count, "staged decrement");
            staged.push(StagedFile { read_count, file });
        }
        Ok(staged)
    }

    fn get(&self, hash: &str) -> LedgerResult<Option<File>> {
        Ok(self.schema.files.get(&file_key(hash))?)
    }

    fn put_adjusted(&self, staged: Vec<StagedFile>) -> LedgerResult<File> {
        let StagedFile { file, .. } = staged.into_iter().next().ok_or_else(|| {
            LedgerError::ReferentialIntegrity("no file staged for adjustment".into())
        })?;
        self.schema.files.put(&file, &file_key(&file.hash))?;
        info!(hash = %file.hash, count = file.reference_count, "reference count adjusted");
        Ok(file)
    }
}

impl<L: ?Sized> Clone for FileStore<L> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
        }
    }
}
