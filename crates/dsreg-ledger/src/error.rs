use std::fmt;

use dsreg_store::StoreError;
use dsreg_types::ValidationError;

/// The kinds of stored entity, for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    User,
    File,
    Dataset,
    Record,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::File => "file",
            Self::Dataset => "dataset",
            Self::Record => "record",
        })
    }
}

/// Coarse classification of a [`LedgerError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    ReferentialIntegrity,
    CommitConflict,
    Store,
    PartialCommit,
}

/// Errors produced by entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {key}")]
    NotFound { entity: EntityKind, key: String },

    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: EntityKind, key: String },

    /// The dataset is in its terminal `Deleted` state.
    #[error("dataset is deleted: {owner}/{name}")]
    DatasetDeleted { owner: String, name: String },

    /// A reference count would go negative or a referenced entity vanished.
    /// Always a logic bug somewhere, never clamped.
    #[error("referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    /// The platform rejected the transaction; resubmit the whole call.
    #[error("commit conflict: {0}")]
    CommitConflict(String),

    #[error("store error: {0}")]
    Store(StoreError),

    /// A staged write sequence failed after `applied` of `total` writes had
    /// already landed. Nothing was rolled back.
    #[error("partial commit: {applied} of {total} writes applied before failure: {source}")]
    PartialCommit {
        applied: usize,
        total: usize,
        #[source]
        source: Box<LedgerError>,
    },
}

impl LedgerError {
    pub fn not_found(entity: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn already_exists(entity: EntityKind, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } | Self::DatasetDeleted { .. } => ErrorKind::Conflict,
            Self::ReferentialIntegrity(_) => ErrorKind::ReferentialIntegrity,
            Self::CommitConflict(_) => ErrorKind::CommitConflict,
            Self::Store(_) => ErrorKind::Store,
            Self::PartialCommit { .. } => ErrorKind::PartialCommit,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CommitConflict { .. } => Self::CommitConflict(err.to_string()),
            other => Self::Store(other),
        }
    }
}

/// Convenience type alias for entity store operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
