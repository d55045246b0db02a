use serde::{Deserialize, Serialize};

/// Behavioural switches for the entity stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Accept download records against soft-deleted datasets. On by default
    /// so the audit trail of a deleted dataset stays complete.
    pub allow_records_on_deleted_datasets: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            allow_records_on_deleted_datasets: true,
        }
    }
}

impl LedgerConfig {
    /// Reject records that point at deleted datasets.
    pub fn strict() -> Self {
        Self {
            allow_records_on_deleted_datasets: false,
        }
    }
}
