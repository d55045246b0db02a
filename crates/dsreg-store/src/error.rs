use thiserror::Error;
use uuid::Uuid;

/// Errors from composite key construction. Always a caller bug.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("entity tag must be non-empty and free of reserved characters: {0:?}")]
    InvalidTag(String),

    #[error("field {index} of {tag} key is empty")]
    EmptyField { tag: String, index: usize },
}

/// Errors from key/value ledger operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid composite key: {0}")]
    Key(#[from] KeyError),

    /// Serialization or deserialization of an entity snapshot failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The platform failed the operation for its own reasons.
    #[error("ledger backend error: {0}")]
    Backend(String),

    /// Optimistic-concurrency rejection at commit time. The whole logical
    /// operation must be resubmitted.
    #[error("commit rejected: key {key} was modified by a concurrent transaction")]
    CommitConflict { key: String },

    #[error("transaction {0} is already closed")]
    TransactionClosed(Uuid),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
