//! Download records.
//!
//! Each record is written twice, once under a dataset-leading key and once
//! under a user-leading key, so both listings are prefix scans.

use std::sync::Arc;

use dsreg_store::KeyValueLedger;
use dsreg_types::validation::{canonical_key_field, validate_dataset_name, validate_user_id};
use dsreg_types::{DatasetFile, Record};
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::mutation::{Expectation, MutationPlan, RecordIndex, StagedWrite};
use crate::schema::{dataset_key, file_key, record_dataset_key, user_key, Schema};

pub struct RecordStore<L: ?Sized> {
    schema: Schema<L>,
    config: LedgerConfig,
}

impl<L: KeyValueLedger + ?Sized> RecordStore<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::with_config(ledger, LedgerConfig::default())
    }

    pub fn with_config(ledger: Arc<L>, config: LedgerConfig) -> Self {
        Self::from_schema(Schema::new(ledger), config)
    }

    pub(crate) fn from_schema(schema: Schema<L>, config: LedgerConfig) -> Self {
        Self { schema, config }
    }

    /// Record that `user` downloaded `files` of a dataset at `time`.
    ///
    /// The user, the dataset and every listed file must exist. Whether a
    /// deleted dataset is acceptable is decided by
    /// [`LedgerConfig::allow_records_on_deleted_datasets`].
    pub fn create_record(
        &self,
        owner: &str,
        dataset_name: &str,
        user: &str,
        files: Vec<DatasetFile>,
        time: &str,
    ) -> LedgerResult<Record> {
        let record = Record {
            dataset_owner: owner.to_string(),
            dataset_name: dataset_name.to_string(),
            user: user.to_string(),
            files,
            time: time.to_string(),
        };
        let plan = self.plan_create_record(&record)?;
        plan.apply(&self.schema)?;
        info!(
            owner = %owner,
            dataset = %dataset_name,
            user = %user,
            files = record.files.len(),
            "record created"
        );
        Ok(record)
    }

    /// Check `record` against the ledger and stage its two index writes.
    pub fn plan_create_record(&self, record: &Record) -> LedgerResult<MutationPlan> {
        record.validate()?;

        if !self.schema.users.exists(&user_key(&record.user))? {
            return Err(LedgerError::not_found(EntityKind::User, record.user.as_str()));
        }

        let dataset = self
            .schema
            .datasets
            .get(&dataset_key(&record.dataset_owner, &record.dataset_name))?
            .ok_or_else(|| {
                LedgerError::not_found(
                    EntityKind::Dataset,
                    format!("{}/{}", record.dataset_owner, record.dataset_name),
                )
            })?;
        if !dataset.is_active() {
            if !self.config.allow_records_on_deleted_datasets {
                return Err(LedgerError::DatasetDeleted {
                    owner: record.dataset_owner.clone(),
                    name: record.dataset_name.clone(),
                });
            }
            debug!(
                owner = %record.dataset_owner,
                dataset = %record.dataset_name,
                "recording download of deleted dataset"
            );
        }

        for file in &record.files {
            if !self.schema.files.exists(&file_key(&file.hash))? {
                return Err(LedgerError::not_found(EntityKind::File, file.hash.as_str()));
            }
        }

        if self
            .schema
            .records_by_dataset
            .exists(&record_dataset_key(record))?
        {
            return Err(LedgerError::already_exists(
                EntityKind::Record,
                format!(
                    "{}/{} by {} at {}",
                    record.dataset_owner, record.dataset_name, record.user, record.time
                ),
            ));
        }

        let mut plan = MutationPlan::new();
        plan.expect(Expectation::RecordAbsent(record.clone()));
        plan.push(StagedWrite::Record(RecordIndex::ByDataset, record.clone()));
        plan.push(StagedWrite::Record(RecordIndex::ByUser, record.clone()));
        Ok(plan)
    }

    /// Every record of one downloader. Order unspecified.
    pub fn query_records_by_user(&self, user: &str) -> LedgerResult<Vec<Record>> {
        validate_user_id("user id", user)?;
        Ok(self
            .schema
            .records_by_user
            .query_by_prefix(&[canonical_key_field(user)])?)
    }

    /// Every record of one dataset. Order unspecified.
    pub fn query_records_by_dataset(&self, owner: &str, name: &str) -> LedgerResult<Vec<Record>> {
        validate_user_id("owner id", owner)?;
        validate_dataset_name(name)?;
        Ok(self
            .schema
            .records_by_dataset
            .query_by_prefix(&dataset_key(owner, name))?)
    }
}

impl<L: ?Sized> Clone for RecordStore<L> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            config: self.config.clone(),
        }
    }
}
