//! Versioned, soft-deletable datasets.
//!
//! A dataset is `Active` from creation until an explicit delete moves it to
//! the terminal `Deleted` state. Versions are append-only and only accepted
//! while active. Every file occurrence in a version holds one reference on
//! that file; deleting the dataset releases all of them.

use std::sync::Arc;

use dsreg_store::KeyValueLedger;
use dsreg_types::validation::{canonical_key_field, validate_dataset_name, validate_user_id};
use dsreg_types::{Dataset, Version};
use tracing::info;

use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::files::{FileStore, StagedFile};
use crate::mutation::{Expectation, MutationPlan, StagedWrite};
use crate::schema::{dataset_key, user_key, Schema};

pub struct DatasetStore<L: ?Sized> {
    schema: Schema<L>,
    files: FileStore<L>,
}

impl<L: KeyValueLedger + ?Sized> DatasetStore<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::from_schema(Schema::new(ledger))
    }

    pub(crate) fn from_schema(schema: Schema<L>) -> Self {
        Self {
            files: FileStore::from_schema(schema.clone()),
            schema,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Create a dataset, optionally with initial versions. Every file the
    /// versions reference must exist and gains one reference per occurrence.
    pub fn create_dataset(
        &self,
        owner: &str,
        name: &str,
        versions: Vec<Version>,
    ) -> LedgerResult<Dataset> {
        let (dataset, plan) = self.stage_create(owner, name, versions)?;
        self.commit(&plan)?;
        info!(owner = %owner, name = %name, versions = dataset.versions.len(), "dataset created");
        Ok(dataset)
    }

    /// Append a version to an active dataset.
    pub fn add_version(&self, owner: &str, name: &str, version: Version) -> LedgerResult<Dataset> {
        let (dataset, plan) = self.stage_add_version(owner, name, version)?;
        self.commit(&plan)?;
        info!(
            owner = %owner,
            name = %name,
            version = dataset.versions.len(),
            files = plan.len() - 1,
            "version added"
        );
        Ok(dataset)
    }

    /// Mark an active dataset deleted and release every file reference its
    /// versions hold.
    pub fn delete_dataset(&self, owner: &str, name: &str) -> LedgerResult<Dataset> {
        let (dataset, plan) = self.stage_delete(owner, name)?;
        self.commit(&plan)?;
        info!(owner = %owner, name = %name, files = plan.len() - 1, "dataset deleted");
        Ok(dataset)
    }

    /// The checked write list `create_dataset` would apply.
    pub fn plan_create_dataset(
        &self,
        owner: &str,
        name: &str,
        versions: Vec<Version>,
    ) -> LedgerResult<MutationPlan> {
        Ok(self.stage_create(owner, name, versions)?.1)
    }

    /// The checked write list `add_version` would apply.
    pub fn plan_add_version(
        &self,
        owner: &str,
        name: &str,
        version: Version,
    ) -> LedgerResult<MutationPlan> {
        Ok(self.stage_add_version(owner, name, version)?.1)
    }

    /// The checked write list `delete_dataset` would apply.
    pub fn plan_delete_dataset(&self, owner: &str, name: &str) -> LedgerResult<MutationPlan> {
        Ok(self.stage_delete(owner, name)?.1)
    }

    /// Apply a plan produced by one of the `plan_*` methods.
    ///
    /// The dataset and file state the plan was built against is read again
    /// first. If any of it changed, nothing is written and the call fails
    /// with [`LedgerError::ReferentialIntegrity`]; build a fresh plan.
    pub fn commit(&self, plan: &MutationPlan) -> LedgerResult<()> {
        plan.apply(&self.schema)
    }

    fn stage_create(
        &self,
        owner: &str,
        name: &str,
        versions: Vec<Version>,
    ) -> LedgerResult<(Dataset, MutationPlan)> {
        let dataset = Dataset::with_versions(owner, name, versions);
        dataset.validate()?;

        if !self.schema.users.exists(&user_key(owner))? {
            return Err(LedgerError::not_found(EntityKind::User, owner));
        }
        if self.schema.datasets.exists(&dataset_key(owner, name))? {
            return Err(LedgerError::already_exists(
                EntityKind::Dataset,
                display_key(owner, name),
            ));
        }

        let staged = self.files.stage_increments(&dataset.file_occurrences())?;
        let expected = Expectation::DatasetAbsent {
            owner: owner.to_string(),
            name: name.to_string(),
        };
        Ok(plan_with(expected, staged, dataset))
    }

    fn stage_add_version(
        &self,
        owner: &str,
        name: &str,
        version: Version,
    ) -> LedgerResult<(Dataset, MutationPlan)> {
        validate_key(owner, name)?;
        version.validate()?;

        let mut dataset = self.active_dataset(owner, name)?;
        let staged = self.files.stage_increments(&version.file_occurrences())?;
        let expected = expect_active(&dataset);
        dataset.versions.push(version);
        Ok(plan_with(expected, staged, dataset))
    }

    fn stage_delete(&self, owner: &str, name: &str) -> LedgerResult<(Dataset, MutationPlan)> {
        validate_key(owner, name)?;

        let mut dataset = self.active_dataset(owner, name)?;
        let staged = self.files.stage_decrements(&dataset.file_occurrences())?;
        let expected = expect_active(&dataset);
        dataset.deleted = true;
        Ok(plan_with(expected, staged, dataset))
    }

    fn active_dataset(&self, owner: &str, name: &str) -> LedgerResult<Dataset> {
        let dataset = self.get(owner, name)?;
        if !dataset.is_active() {
            return Err(LedgerError::DatasetDeleted {
                owner: owner.to_string(),
                name: name.to_string(),
            });
        }
        Ok(dataset)
    }

    fn get(&self, owner: &str, name: &str) -> LedgerResult<Dataset> {
        self.schema
            .datasets
            .get(&dataset_key(owner, name))?
            .ok_or_else(|| LedgerError::not_found(EntityKind::Dataset, display_key(owner, name)))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Deleted datasets are returned too, with `deleted = true`.
    pub fn query_dataset(&self, owner: &str, name: &str) -> LedgerResult<Dataset> {
        validate_key(owner, name)?;
        self.get(owner, name)
    }

    /// Every dataset including deleted ones. Order unspecified.
    pub fn query_all_datasets(&self) -> LedgerResult<Vec<Dataset>> {
        Ok(self.schema.datasets.query_all()?)
    }

    /// Every dataset of an existing owner, including deleted ones.
    pub fn query_datasets_by_owner(&self, owner: &str) -> LedgerResult<Vec<Dataset>> {
        validate_user_id("owner id", owner)?;
        if !self.schema.users.exists(&user_key(owner))? {
            return Err(LedgerError::not_found(EntityKind::User, owner));
        }
        Ok(self
            .schema
            .datasets
            .query_by_prefix(&[canonical_key_field(owner)])?)
    }

    pub fn query_active_datasets(&self) -> LedgerResult<Vec<Dataset>> {
        Ok(only_active(self.query_all_datasets()?))
    }

    pub fn query_active_datasets_by_owner(&self, owner: &str) -> LedgerResult<Vec<Dataset>> {
        Ok(only_active(self.query_datasets_by_owner(owner)?))
    }
}

impl<L: ?Sized> Clone for DatasetStore<L> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            files: self.files.clone(),
        }
    }
}

fn validate_key(owner: &str, name: &str) -> LedgerResult<()> {
    validate_user_id("owner id", owner)?;
    validate_dataset_name(name)?;
    Ok(())
}

fn display_key(owner: &str, name: &str) -> String {
    format!("{owner}/{name}")
}

fn expect_active(dataset: &Dataset) -> Expectation {
    Expectation::DatasetActive {
        owner: dataset.owner.clone(),
        name: dataset.name.clone(),
        versions: dataset.versions.len(),
    }
}

/// File writes in hash order, then the dataset. Each file is expected at
/// the count it was read with.
fn plan_with(
    expected: Expectation,
    files: Vec<StagedFile>,
    dataset: Dataset,
) -> (Dataset, MutationPlan) {
    let mut plan = MutationPlan::new();
    plan.expect(expected);
    for StagedFile { read_count, file } in files {
        plan.expect(Expectation::FileCount {
            hash: file.hash.clone(),
            reference_count: read_count,
        });
        plan.push(StagedWrite::File(file));
    }
    plan.push(StagedWrite::Dataset(dataset.clone()));
    (dataset, plan)
}

fn only_active(datasets: Vec<Dataset>) -> Vec<Dataset> {
    datasets.into_iter().filter(Dataset::is_active).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{IntegrityAuditor, ViolationKind};
    use crate::error::ErrorKind;
    use crate::users::UserStore;
    use dsreg_store::{InMemoryKvLedger, StoreError};
    use dsreg_types::{sha256_hex, DatasetFile};
    use proptest::prelude::*;

    struct Fixture {
        ledger: Arc<InMemoryKvLedger>,
        files: FileStore<InMemoryKvLedger>,
        datasets: DatasetStore<InMemoryKvLedger>,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryKvLedger::new());
        UserStore::new(Arc::clone(&ledger))
            .create_user("alice", "Alice")
            .unwrap();
        Fixture {
            files: FileStore::new(Arc::clone(&ledger)),
            datasets: DatasetStore::new(Arc::clone(&ledger)),
            ledger,
        }
    }

    fn version(files: &[(&str, &str)]) -> Version {
        Version {
            files: files
                .iter()
                .map(|(hash, name)| DatasetFile::new(*hash, *name))
                .collect(),
            rows: 10,
            creation_time: "2021-01-01T00:00:00Z".into(),
            change_log: "init".into(),
        }
    }

    fn count(f: &Fixture, hash: &str) -> u64 {
        f.files.query_file(hash).unwrap().reference_count
    }

    fn audit(f: &Fixture) -> crate::audit::AuditReport {
        IntegrityAuditor::new(Arc::clone(&f.ledger)).audit().unwrap()
    }

    #[test]
    fn create_empty_round_trip() {
        let f = fixture();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        assert_eq!(
            f.datasets.query_dataset("alice", "ds1").unwrap(),
            Dataset {
                owner: "alice".into(),
                name: "ds1".into(),
                versions: vec![],
                deleted: false,
            }
        );
    }

    #[test]
    fn create_with_missing_owner_writes_nothing() {
        let f = fixture();
        let err = f.datasets.create_dataset("bob", "ds1", vec![]).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NotFound {
                entity: EntityKind::User,
                ..
            }
        ));
        let err = f.datasets.query_dataset("bob", "ds1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn create_twice_is_conflict() {
        let f = fixture();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        let err = f.datasets.create_dataset("Alice", "DS1", vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn create_with_versions_takes_references() {
        let f = fixture();
        let a = sha256_hex(b"a");
        f.files.create_file(&a, 1).unwrap();
        f.datasets
            .create_dataset("alice", "ds1", vec![version(&[(a.as_str(), "a.txt")])])
            .unwrap();
        assert_eq!(count(&f, &a), 1);
    }

    #[test]
    fn create_with_missing_file_writes_nothing() {
        let f = fixture();
        let before = f.ledger.len().unwrap();
        let missing = sha256_hex(b"missing");
        let err = f
            .datasets
            .create_dataset("alice", "ds1", vec![version(&[(missing.as_str(), "a.txt")])])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(f.ledger.len().unwrap(), before);
    }

    #[test]
    fn add_version_counts_each_occurrence() {
        let f = fixture();
        let a = sha256_hex(b"a");
        let b = sha256_hex(b"b");
        f.files.create_file(&a, 1).unwrap();
        f.files.create_file(&b, 1).unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();

        f.datasets
            .add_version("alice", "ds1", version(&[(a.as_str(), "a.txt")]))
            .unwrap();
        assert_eq!(count(&f, &a), 1);

        let ds = f
            .datasets
            .add_version("alice", "ds1", version(&[(a.as_str(), "a1.txt"), (a.as_str(), "a2.txt"), (b.as_str(), "b.txt")]))
            .unwrap();
        assert_eq!(ds.versions.len(), 2);
        assert_eq!(count(&f, &a), 3);
        assert_eq!(count(&f, &b), 1);
    }

    #[test]
    fn add_version_rejects_loose_timestamp() {
        let f = fixture();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        let mut v = version(&[]);
        v.creation_time = "2021-01-01T00:00:00".into();
        let err = f.datasets.add_version("alice", "ds1", v).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(f.datasets.query_dataset("alice", "ds1").unwrap().versions.is_empty());
    }

    #[test]
    fn add_version_to_missing_dataset() {
        let f = fixture();
        let err = f
            .datasets
            .add_version("alice", "nope", version(&[]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn delete_releases_every_occurrence() {
        let f = fixture();
        let a = sha256_hex(b"a");
        f.files.create_file(&a, 1).unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        f.datasets.create_dataset("alice", "ds2", vec![]).unwrap();
        f.datasets
            .add_version("alice", "ds1", version(&[(a.as_str(), "a1.txt"), (a.as_str(), "a2.txt")]))
            .unwrap();
        f.datasets
            .add_version("alice", "ds1", version(&[(a.as_str(), "a.txt")]))
            .unwrap();
        f.datasets
            .add_version("alice", "ds2", version(&[(a.as_str(), "a.txt")]))
            .unwrap();
        assert_eq!(count(&f, &a), 4);

        let ds = f.datasets.delete_dataset("alice", "ds1").unwrap();
        assert!(ds.deleted);
        assert_eq!(count(&f, &a), 1);
        assert!(f.datasets.query_dataset("alice", "ds1").unwrap().deleted);
    }

    #[test]
    fn deleted_is_terminal() {
        let f = fixture();
        let a = sha256_hex(b"a");
        f.files.create_file(&a, 1).unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        f.datasets.delete_dataset("alice", "ds1").unwrap();

        let err = f
            .datasets
            .add_version("alice", "ds1", version(&[(a.as_str(), "a.txt")]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::DatasetDeleted { .. }));
        assert_eq!(count(&f, &a), 0);

        let err = f.datasets.delete_dataset("alice", "ds1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn plan_orders_files_by_hash_then_dataset() {
        let f = fixture();
        let mut hashes = vec![sha256_hex(b"x"), sha256_hex(b"y"), sha256_hex(b"z")];
        for h in &hashes {
            f.files.create_file(h, 1).unwrap();
        }
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        let v = version(&[(hashes[2].as_str(), "z"), (hashes[0].as_str(), "x"), (hashes[1].as_str(), "y")]);

        let plan = f.datasets.plan_add_version("alice", "ds1", v).unwrap();
        hashes.sort();
        let planned: Vec<&str> = plan
            .writes()
            .iter()
            .filter_map(|w| match w {
                StagedWrite::File(file) => Some(file.hash.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(planned, hashes.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(matches!(plan.writes().last(), Some(StagedWrite::Dataset(_))));

        // Planning alone writes nothing.
        assert_eq!(count(&f, &hashes[0]), 0);
        f.datasets.commit(&plan).unwrap();
        assert_eq!(count(&f, &hashes[0]), 1);
    }

    #[test]
    fn partial_add_version_leaves_counts_ahead_of_dataset() {
        let f = fixture();
        let a = sha256_hex(b"a");
        let b = sha256_hex(b"b");
        f.files.create_file(&a, 1).unwrap();
        f.files.create_file(&b, 1).unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();

        f.ledger.fail_after_puts(2).unwrap();
        let err = f
            .datasets
            .add_version("alice", "ds1", version(&[(a.as_str(), "a.txt"), (b.as_str(), "b.txt")]))
            .unwrap_err();
        f.ledger.clear_faults().unwrap();

        assert!(matches!(
            err,
            LedgerError::PartialCommit {
                applied: 2,
                total: 3,
                ..
            }
        ));
        assert_eq!(count(&f, &a), 1);
        assert_eq!(count(&f, &b), 1);
        assert!(f.datasets.query_dataset("alice", "ds1").unwrap().versions.is_empty());
    }

    #[test]
    fn failed_first_write_is_plain_store_error() {
        let f = fixture();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        f.ledger.fail_after_puts(0).unwrap();
        let err = f
            .datasets
            .add_version("alice", "ds1", version(&[]))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Store(StoreError::Backend(_))));
    }

    #[test]
    fn stale_concurrent_add_version_is_rejected_and_resubmits() {
        let f = fixture();
        let a = sha256_hex(b"a");
        f.files.create_file(&a, 1).unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();

        let first = Arc::new(f.ledger.begin());
        let second = Arc::new(f.ledger.begin());
        DatasetStore::new(Arc::clone(&first))
            .add_version("alice", "ds1", version(&[(a.as_str(), "one.txt")]))
            .unwrap();
        DatasetStore::new(Arc::clone(&second))
            .add_version("alice", "ds1", version(&[(a.as_str(), "two.txt")]))
            .unwrap();

        first.commit().unwrap();
        let err: LedgerError = second.commit().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::CommitConflict);
        assert_eq!(count(&f, &a), 1);

        let retry = Arc::new(f.ledger.begin());
        DatasetStore::new(Arc::clone(&retry))
            .add_version("alice", "ds1", version(&[(a.as_str(), "two.txt")]))
            .unwrap();
        retry.commit().unwrap();
        assert_eq!(count(&f, &a), 2);
        assert_eq!(f.datasets.query_dataset("alice", "ds1").unwrap().versions.len(), 2);
    }

    #[test]
    fn stale_plan_is_rejected_before_any_write() {
        let f = fixture();
        let a = sha256_hex(b"a");
        let b = sha256_hex(b"b");
        f.files.create_file(&a, 1).unwrap();
        f.files.create_file(&b, 1).unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();

        let plan = f
            .datasets
            .plan_add_version("alice", "ds1", version(&[(a.as_str(), "a.txt")]))
            .unwrap();
        f.datasets
            .add_version("alice", "ds1", version(&[(b.as_str(), "b.txt")]))
            .unwrap();

        let err = f.datasets.commit(&plan).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);
        let ds = f.datasets.query_dataset("alice", "ds1").unwrap();
        assert_eq!(ds.versions.len(), 1);
        assert_eq!(ds.versions[0].files[0].hash, b);
        assert_eq!(count(&f, &a), 0);
        assert_eq!(count(&f, &b), 1);
        assert!(audit(&f).is_valid());
    }

    #[test]
    fn plan_commits_once() {
        let f = fixture();
        let a = sha256_hex(b"a");
        f.files.create_file(&a, 1).unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();

        let plan = f
            .datasets
            .plan_add_version("alice", "ds1", version(&[(a.as_str(), "a.txt")]))
            .unwrap();
        f.datasets.commit(&plan).unwrap();
        let err = f.datasets.commit(&plan).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);
        assert_eq!(count(&f, &a), 1);

        let create = f.datasets.plan_create_dataset("alice", "ds2", vec![]).unwrap();
        let delete = f.datasets.plan_delete_dataset("alice", "ds1").unwrap();
        f.datasets.create_dataset("alice", "ds2", vec![]).unwrap();
        f.datasets.delete_dataset("alice", "ds1").unwrap();
        assert!(f.datasets.commit(&create).is_err());
        assert!(f.datasets.commit(&delete).is_err());
        assert_eq!(count(&f, &a), 0);
        assert!(audit(&f).is_valid());
    }

    #[test]
    fn partial_delete_releases_counts_before_the_flag() {
        let f = fixture();
        let a = sha256_hex(b"a");
        f.files.create_file(&a, 1).unwrap();
        f.datasets
            .create_dataset("alice", "ds1", vec![version(&[(a.as_str(), "a.txt")])])
            .unwrap();

        f.ledger.fail_after_puts(1).unwrap();
        let err = f.datasets.delete_dataset("alice", "ds1").unwrap_err();
        f.ledger.clear_faults().unwrap();

        assert!(matches!(
            err,
            LedgerError::PartialCommit {
                applied: 1,
                total: 2,
                ..
            }
        ));
        assert!(!f.datasets.query_dataset("alice", "ds1").unwrap().deleted);
        assert_eq!(count(&f, &a), 0);
        assert_eq!(
            audit(&f)
                .violations_of(ViolationKind::ReferenceCountMismatch)
                .count(),
            1
        );

        // The released references cannot be released again.
        let err = f.datasets.delete_dataset("alice", "ds1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);
        assert_eq!(count(&f, &a), 0);
        assert!(!f.datasets.query_dataset("alice", "ds1").unwrap().deleted);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Create(usize, Vec<usize>),
        AddVersion(usize, Vec<usize>),
        Delete(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        let files = prop::collection::vec(0..3usize, 0..4);
        prop_oneof![
            (0..2usize, files.clone()).prop_map(|(d, f)| Op::Create(d, f)),
            (0..2usize, files).prop_map(|(d, f)| Op::AddVersion(d, f)),
            (0..2usize).prop_map(Op::Delete),
        ]
    }

    fn version_of(hashes: &[String], picks: &[usize]) -> Version {
        let names: Vec<String> = (0..picks.len()).map(|i| format!("f{i}.bin")).collect();
        let files: Vec<(&str, &str)> = picks
            .iter()
            .zip(&names)
            .map(|(&i, name)| (hashes[i].as_str(), name.as_str()))
            .collect();
        version(&files)
    }

    proptest! {
        #[test]
        fn valid_sequences_keep_counts_consistent(ops in prop::collection::vec(op(), 0..24)) {
            let f = fixture();
            let hashes: Vec<String> = (0..3u8).map(|i| sha256_hex(&[i])).collect();
            for hash in &hashes {
                f.files.create_file(hash, 1).unwrap();
            }
            let names = ["ds1", "ds2"];

            for op in ops {
                let result = match &op {
                    Op::Create(d, picks) if picks.is_empty() => {
                        f.datasets.create_dataset("alice", names[*d], vec![])
                    }
                    Op::Create(d, picks) => f.datasets.create_dataset(
                        "alice",
                        names[*d],
                        vec![version_of(&hashes, picks)],
                    ),
                    Op::AddVersion(d, picks) => {
                        f.datasets.add_version("alice", names[*d], version_of(&hashes, picks))
                    }
                    Op::Delete(d) => f.datasets.delete_dataset("alice", names[*d]),
                };
                if let Err(err) = result {
                    prop_assert!(
                        matches!(err.kind(), ErrorKind::NotFound | ErrorKind::Conflict),
                        "{:?} failed with {}", op, err
                    );
                }
            }

            let report = audit(&f);
            prop_assert!(report.is_valid(), "{:?}", report.violations);
        }
    }

    #[test]
    fn owner_queries() {
        let f = fixture();
        UserStore::new(Arc::clone(&f.ledger))
            .create_user("alicia", "Alicia")
            .unwrap();
        f.datasets.create_dataset("alice", "ds1", vec![]).unwrap();
        f.datasets.create_dataset("alice", "ds2", vec![]).unwrap();
        f.datasets.create_dataset("alicia", "ds3", vec![]).unwrap();
        f.datasets.delete_dataset("alice", "ds2").unwrap();

        let mut names: Vec<String> = f
            .datasets
            .query_datasets_by_owner("ALICE")
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["ds1".to_string(), "ds2".to_string()]);

        let active = f.datasets.query_active_datasets_by_owner("alice").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(f.datasets.query_all_datasets().unwrap().len(), 3);
        assert_eq!(f.datasets.query_active_datasets().unwrap().len(), 2);

        let err = f.datasets.query_datasets_by_owner("nobody").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
