use std::sync::Arc;

use dsreg_store::KeyValueLedger;

use crate::audit::{AuditReport, IntegrityAuditor};
use crate::config::LedgerConfig;
use crate::datasets::DatasetStore;
use crate::error::LedgerResult;
use crate::files::FileStore;
use crate::records::RecordStore;
use crate::schema::Schema;
use crate::users::UserStore;

/// The four entity stores over one shared key/value ledger.
///
/// Construct one per unit of work: hand it the committed ledger, or a
/// transaction opened on it, and every store reads and writes through that
/// handle.
pub struct EntityLedger<L: ?Sized> {
    ledger: Arc<L>,
    config: LedgerConfig,
    users: UserStore<L>,
    files: FileStore<L>,
    datasets: DatasetStore<L>,
    records: RecordStore<L>,
}

impl<L: KeyValueLedger + ?Sized> EntityLedger<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::with_config(ledger, LedgerConfig::default())
    }

    pub fn with_config(ledger: Arc<L>, config: LedgerConfig) -> Self {
        let schema = Schema::new(Arc::clone(&ledger));
        Self {
            users: UserStore::from_schema(schema.clone()),
            files: FileStore::from_schema(schema.clone()),
            datasets: DatasetStore::from_schema(schema.clone()),
            records: RecordStore::from_schema(schema, config.clone()),
            config,
            ledger,
        }
    }

    pub fn users(&self) -> &UserStore<L> {
        &self.users
    }

    pub fn files(&self) -> &FileStore<L> {
        &self.files
    }

    pub fn datasets(&self) -> &DatasetStore<L> {
        &self.datasets
    }

    pub fn records(&self) -> &RecordStore<L> {
        &self.records
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The underlying key/value handle.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn audit(&self) -> LedgerResult<AuditReport> {
        IntegrityAuditor::new(Arc::clone(&self.ledger)).audit()
    }
}
