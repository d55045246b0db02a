//! Staged multi-key writes.
//!
//! The key/value ledger has no multi-key transactions, so operations that
//! touch several keys do all their reads and checks first, collect the
//! resulting full-value writes into a [`MutationPlan`], and only then apply
//! them in order. A failure after the first write is reported as
//! [`LedgerError::PartialCommit`]; the writes that landed stay in place.
//!
//! A plan also records the state it was checked against. Applying it
//! re-reads those keys first and refuses, before any write, if the ledger
//! has moved on since.

use dsreg_store::KeyValueLedger;
use dsreg_types::{Dataset, File, Record};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::schema::{dataset_key, file_key, record_dataset_key, record_user_key, Schema};

/// Which of the two record indexes a record write targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordIndex {
    ByUser,
    ByDataset,
}

/// One full-value write of a plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StagedWrite {
    File(File),
    Dataset(Dataset),
    Record(RecordIndex, Record),
}

impl StagedWrite {
    fn apply<L: KeyValueLedger + ?Sized>(&self, schema: &Schema<L>) -> LedgerResult<()> {
        match self {
            Self::File(file) => schema.files.put(file, &file_key(&file.hash))?,
            Self::Dataset(dataset) => schema
                .datasets
                .put(dataset, &dataset_key(&dataset.owner, &dataset.name))?,
            Self::Record(RecordIndex::ByUser, record) => schema
                .records_by_user
                .put(record, &record_user_key(record))?,
            Self::Record(RecordIndex::ByDataset, record) => schema
                .records_by_dataset
                .put(record, &record_dataset_key(record))?,
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match self {
            Self::File(file) => format!("file {}", file.hash),
            Self::Dataset(dataset) => format!("dataset {}/{}", dataset.owner, dataset.name),
            Self::Record(index, record) => format!(
                "record {:?} {}/{} by {} at {}",
                index, record.dataset_owner, record.dataset_name, record.user, record.time
            ),
        }
    }
}

/// Ledger state a plan was built against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// The file exists with exactly this reference count.
    FileCount { hash: String, reference_count: u64 },
    /// No dataset is stored under this owner and name.
    DatasetAbsent { owner: String, name: String },
    /// The dataset is active and holds exactly `versions` versions.
    DatasetActive {
        owner: String,
        name: String,
        versions: usize,
    },
    /// The record is not in the dataset-leading index yet.
    RecordAbsent(Record),
}

impl Expectation {
    /// Describe how the ledger differs from this expectation, if it does.
    fn mismatch<L: KeyValueLedger + ?Sized>(
        &self,
        schema: &Schema<L>,
    ) -> LedgerResult<Option<String>> {
        Ok(match self {
            Self::FileCount {
                hash,
                reference_count,
            } => match schema.files.get(&file_key(hash))? {
                None => Some(format!("file {hash} is missing")),
                Some(file) if file.reference_count != *reference_count => Some(format!(
                    "file {hash} has reference count {}, planned against {reference_count}",
                    file.reference_count
                )),
                Some(_) => None,
            },
            Self::DatasetAbsent { owner, name } => schema
                .datasets
                .exists(&dataset_key(owner, name))?
                .then(|| format!("dataset {owner}/{name} already exists")),
            Self::DatasetActive {
                owner,
                name,
                versions,
            } => match schema.datasets.get(&dataset_key(owner, name))? {
                None => Some(format!("dataset {owner}/{name} is missing")),
                Some(dataset) if dataset.deleted => {
                    Some(format!("dataset {owner}/{name} is deleted"))
                }
                Some(dataset) if dataset.versions.len() != *versions => Some(format!(
                    "dataset {owner}/{name} has {} versions, planned against {versions}",
                    dataset.versions.len()
                )),
                Some(_) => None,
            },
            Self::RecordAbsent(record) => schema
                .records_by_dataset
                .exists(&record_dataset_key(record))?
                .then(|| {
                    format!(
                        "record {}/{} by {} at {} already exists",
                        record.dataset_owner, record.dataset_name, record.user, record.time
                    )
                }),
        })
    }
}

/// Ordered list of writes produced by a fully checked operation.
///
/// Only the entity stores build plans.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationPlan {
    expected: Vec<Expectation>,
    writes: Vec<StagedWrite>,
}

impl MutationPlan {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, write: StagedWrite) {
        self.writes.push(write);
    }

    pub(crate) fn expect(&mut self, expectation: Expectation) {
        self.expected.push(expectation);
    }

    pub fn writes(&self) -> &[StagedWrite] {
        &self.writes
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expected
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// The dataset snapshot this plan writes, if any.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.writes.iter().rev().find_map(|w| match w {
            StagedWrite::Dataset(dataset) => Some(dataset),
            _ => None,
        })
    }

    /// Re-read every expected key. A plan whose state has moved on is a
    /// [`LedgerError::ReferentialIntegrity`] failure.
    pub(crate) fn verify<L: KeyValueLedger + ?Sized>(&self, schema: &Schema<L>) -> LedgerResult<()> {
        for expectation in &self.expected {
            if let Some(found) = expectation.mismatch(schema)? {
                warn!(mismatch = %found, "stale mutation plan rejected");
                return Err(LedgerError::ReferentialIntegrity(format!("stale plan: {found}")));
            }
        }
        Ok(())
    }

    /// Verify, then apply every write in order.
    ///
    /// A failure on the first write is returned as-is, since nothing
    /// changed. A failure on any later write becomes
    /// [`LedgerError::PartialCommit`] carrying how many writes landed.
    pub(crate) fn apply<L: KeyValueLedger + ?Sized>(&self, schema: &Schema<L>) -> LedgerResult<()> {
        self.verify(schema)?;
        let total = self.writes.len();
        for (applied, write) in self.writes.iter().enumerate() {
            if let Err(source) = write.apply(schema) {
                if applied == 0 {
                    return Err(source);
                }
                warn!(
                    applied,
                    total,
                    failed = %write.describe(),
                    error = %source,
                    "staged write failed after partial application"
                );
                return Err(LedgerError::PartialCommit {
                    applied,
                    total,
                    source: Box::new(source),
                });
            }
        }
        debug!(writes = total, "mutation plan applied");
        Ok(())
    }
}
