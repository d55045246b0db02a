//! Read-only integrity audit over the whole ledger.
//!
//! Recomputes every file's expected reference count from the live datasets
//! and checks that every reference between entities resolves. The audit
//! never writes; it is how partial commits are found after the fact.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use dsreg_store::KeyValueLedger;
use dsreg_types::validation::canonical_key_field;
use dsreg_types::Record;
use tracing::{debug, warn};

use crate::error::LedgerResult;
use crate::schema::{record_dataset_key, record_user_key, Schema};

/// Outcome of an audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub users_checked: usize,
    pub files_checked: usize,
    pub datasets_checked: usize,
    pub records_checked: usize,
    pub references_resolved: bool,
    pub counts_consistent: bool,
    pub records_paired: bool,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations_of(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

/// One broken invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// The entity the violation was found on.
    pub subject: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    MissingFile,
    MissingUser,
    MissingDataset,
    ReferenceCountMismatch,
    UnpairedRecord,
}

pub struct IntegrityAuditor<L: ?Sized> {
    schema: Schema<L>,
}

impl<L: KeyValueLedger + ?Sized> IntegrityAuditor<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::from_schema(Schema::new(ledger))
    }

    pub(crate) fn from_schema(schema: Schema<L>) -> Self {
        Self { schema }
    }

    pub fn audit(&self) -> LedgerResult<AuditReport> {
        let users = self.schema.users.query_all()?;
        let files = self.schema.files.query_all()?;
        let datasets = self.schema.datasets.query_all()?;
        let by_dataset = self.schema.records_by_dataset.query_all()?;
        let by_user = self.schema.records_by_user.query_all()?;

        let user_ids: HashSet<String> = users.iter().map(|u| u.key_id()).collect();
        let file_counts: BTreeMap<&str, u64> = files
            .iter()
            .map(|f| (f.hash.as_str(), f.reference_count))
            .collect();
        let dataset_keys: HashSet<[String; 2]> = datasets.iter().map(|d| d.key_fields()).collect();

        let mut violations = Vec::new();
        let mut expected: BTreeMap<String, u64> = BTreeMap::new();

        for dataset in &datasets {
            let subject = format!("dataset {}/{}", dataset.owner, dataset.name);
            if !user_ids.contains(&canonical_key_field(&dataset.owner)) {
                violations.push(Violation {
                    kind: ViolationKind::MissingUser,
                    subject: subject.clone(),
                    description: format!("owner {} does not exist", dataset.owner),
                });
            }
            for (hash, n) in dataset.file_occurrences() {
                if !file_counts.contains_key(hash.as_str()) {
                    violations.push(Violation {
                        kind: ViolationKind::MissingFile,
                        subject: subject.clone(),
                        description: format!("version references missing file {hash}"),
                    });
                }
                if dataset.is_active() {
                    *expected.entry(hash).or_insert(0) += n;
                }
            }
        }

        for file in &files {
            let want = expected.get(&file.hash).copied().unwrap_or(0);
            if file.reference_count != want {
                violations.push(Violation {
                    kind: ViolationKind::ReferenceCountMismatch,
                    subject: format!("file {}", file.hash),
                    description: format!(
                        "reference count is {}, live versions list it {want} times",
                        file.reference_count
                    ),
                });
            }
        }

        for record in &by_dataset {
            check_record(record, &user_ids, &file_counts, &dataset_keys, &mut violations);
        }
        let paired_user_keys: HashSet<[String; 4]> = by_user.iter().map(record_user_key).collect();
        let paired_dataset_keys: HashSet<[String; 4]> =
            by_dataset.iter().map(record_dataset_key).collect();
        for record in &by_dataset {
            if !paired_user_keys.contains(&record_user_key(record)) {
                violations.push(unpaired(record, "user"));
            }
        }
        for record in &by_user {
            if !paired_dataset_keys.contains(&record_dataset_key(record)) {
                violations.push(unpaired(record, "dataset"));
            }
        }

        let report = AuditReport {
            users_checked: users.len(),
            files_checked: files.len(),
            datasets_checked: datasets.len(),
            records_checked: by_dataset.len(),
            references_resolved: !violations.iter().any(|v| {
                matches!(
                    v.kind,
                    ViolationKind::MissingFile | ViolationKind::MissingUser | ViolationKind::MissingDataset
                )
            }),
            counts_consistent: !violations
                .iter()
                .any(|v| v.kind == ViolationKind::ReferenceCountMismatch),
            records_paired: !violations
                .iter()
                .any(|v| v.kind == ViolationKind::UnpairedRecord),
            violations,
        };

        if report.is_valid() {
            debug!(
                files = report.files_checked,
                datasets = report.datasets_checked,
                records = report.records_checked,
                "audit clean"
            );
        } else {
            warn!(violations = report.violations.len(), "audit found violations");
        }
        Ok(report)
    }
}

fn record_subject(record: &Record) -> String {
    format!(
        "record {}/{} by {} at {}",
        record.dataset_owner, record.dataset_name, record.user, record.time
    )
}

fn check_record(
    record: &Record,
    user_ids: &HashSet<String>,
    file_counts: &BTreeMap<&str, u64>,
    dataset_keys: &HashSet<[String; 2]>,
    violations: &mut Vec<Violation>,
) {
    if !user_ids.contains(&canonical_key_field(&record.user)) {
        violations.push(Violation {
            kind: ViolationKind::MissingUser,
            subject: record_subject(record),
            description: format!("user {} does not exist", record.user),
        });
    }
    let dataset = [
        canonical_key_field(&record.dataset_owner),
        canonical_key_field(&record.dataset_name),
    ];
    if !dataset_keys.contains(&dataset) {
        violations.push(Violation {
            kind: ViolationKind::MissingDataset,
            subject: record_subject(record),
            description: "dataset does not exist".into(),
        });
    }
    for file in &record.files {
        if !file_counts.contains_key(file.hash.as_str()) {
            violations.push(Violation {
                kind: ViolationKind::MissingFile,
                subject: record_subject(record),
                description: format!("references missing file {}", file.hash),
            });
        }
    }
}

fn unpaired(record: &Record, missing_index: &str) -> Violation {
    Violation {
        kind: ViolationKind::UnpairedRecord,
        subject: record_subject(record),
        description: format!("no matching entry in the {missing_index} index"),
    }
}
