//! Entity tags and key layouts.
//!
//! | entity            | tag              | key fields                        |
//! |-------------------|------------------|-----------------------------------|
//! | user              | `user`           | id                                |
//! | file              | `file`           | hash                              |
//! | dataset           | `dataset`        | owner, name                       |
//! | record by user    | `record-user`    | user, owner, name, time           |
//! | record by dataset | `record-dataset` | owner, name, user, time           |
//!
//! User ids, dataset owners and dataset names are lowercased before
//! encoding; hashes and timestamps are used verbatim.

use std::sync::Arc;

use dsreg_store::{EntityRepository, KeyValueLedger};
use dsreg_types::validation::canonical_key_field;
use dsreg_types::{Dataset, File, Record, User};

pub const USER_TAG: &str = "user";
pub const FILE_TAG: &str = "file";
pub const DATASET_TAG: &str = "dataset";
pub const RECORD_BY_USER_TAG: &str = "record-user";
pub const RECORD_BY_DATASET_TAG: &str = "record-dataset";

pub fn user_key(id: &str) -> [String; 1] {
    [canonical_key_field(id)]
}

pub fn file_key(hash: &str) -> [String; 1] {
    [hash.to_string()]
}

pub fn dataset_key(owner: &str, name: &str) -> [String; 2] {
    [canonical_key_field(owner), canonical_key_field(name)]
}

pub fn record_user_key(record: &Record) -> [String; 4] {
    [
        canonical_key_field(&record.user),
        canonical_key_field(&record.dataset_owner),
        canonical_key_field(&record.dataset_name),
        record.time.clone(),
    ]
}

pub fn record_dataset_key(record: &Record) -> [String; 4] {
    [
        canonical_key_field(&record.dataset_owner),
        canonical_key_field(&record.dataset_name),
        canonical_key_field(&record.user),
        record.time.clone(),
    ]
}

/// One typed repository per entity tag, all over the same ledger.
pub struct Schema<L: ?Sized> {
    pub users: EntityRepository<User, L>,
    pub files: EntityRepository<File, L>,
    pub datasets: EntityRepository<Dataset, L>,
    pub records_by_user: EntityRepository<Record, L>,
    pub records_by_dataset: EntityRepository<Record, L>,
}

impl<L: KeyValueLedger + ?Sized> Schema<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            users: EntityRepository::new(Arc::clone(&ledger), USER_TAG),
            files: EntityRepository::new(Arc::clone(&ledger), FILE_TAG),
            datasets: EntityRepository::new(Arc::clone(&ledger), DATASET_TAG),
            records_by_user: EntityRepository::new(Arc::clone(&ledger), RECORD_BY_USER_TAG),
            records_by_dataset: EntityRepository::new(ledger, RECORD_BY_DATASET_TAG),
        }
    }
}

impl<L: ?Sized> Clone for Schema<L> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            files: self.files.clone(),
            datasets: self.datasets.clone(),
            records_by_user: self.records_by_user.clone(),
            records_by_dataset: self.records_by_dataset.clone(),
        }
    }
}
