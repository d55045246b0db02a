use thiserror::Error;

/// Malformed input rejected before any ledger access.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} characters, got {actual}")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("{field} must contain only letters, numbers, and underscores")]
    Charset { field: &'static str },

    #[error("{field} contains forbidden character {ch:?}")]
    ForbiddenChar { field: &'static str, ch: char },

    #[error("{field} must be between {min} and {max}, got {actual}")]
    Range {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("{field} is not a decimal integer: {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} must be a SHA-256 hash (64 lowercase hex characters), got {value:?}")]
    Sha256 { field: &'static str, value: String },

    #[error("{field} must be a UTC timestamp of the form YYYY-MM-DDThh:mm:ssZ, got {value:?}")]
    Timestamp { field: &'static str, value: String },

    #[error("duplicate filename in version: {filename}")]
    DuplicateFilename { filename: String },
}
