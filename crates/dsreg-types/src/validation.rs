//! Pure validation predicates shared by every entity.
//!
//! The `is_*` / `within_*` functions are plain predicates. The `validate_*`
//! functions wrap them and name the offending field in the returned
//! [`ValidationError`]. Nothing here touches the ledger.
//!
//! Rules:
//! - Identifiers (user ids, user names, dataset names): `[A-Za-z0-9_]`
//! - File hashes: SHA-256, 64 lowercase hex characters
//! - Timestamps: exactly `YYYY-MM-DDThh:mm:ssZ`, and a real calendar instant
//! - Filenames: 1-64 characters, no path separators or shell metacharacters

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::ValidationError;

pub const USER_ID_MIN_LEN: usize = 3;
pub const USER_ID_MAX_LEN: usize = 16;
pub const DATASET_NAME_MIN_LEN: usize = 1;
pub const DATASET_NAME_MAX_LEN: usize = 64;
pub const FILENAME_MIN_LEN: usize = 1;
pub const FILENAME_MAX_LEN: usize = 64;
pub const CHANGE_LOG_MAX_LEN: usize = 1024;

/// Largest accepted file size in bytes (2 GiB, inclusive).
pub const MAX_FILE_SIZE: i64 = 2 * 1024 * 1024 * 1024;

/// Characters that may never appear in a filename.
const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', ';', ',', '?', '"', '*', '|', '/', '\\'];

const TIMESTAMP_LEN: usize = 20;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Character count of `value` lies in `[min, max]`.
pub fn within_length(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

pub fn within_range(value: i64, min: i64, max: i64) -> bool {
    value >= min && value <= max
}

/// Non-empty and only ASCII letters, digits and underscores.
pub fn is_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Exactly 64 lowercase hex digits.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Matches `DDDD-DD-DDTDD:DD:DDZ` byte for byte. No offsets, no fractions.
pub fn is_timestamp_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != TIMESTAMP_LEN {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b'T',
        13 | 16 => *b == b':',
        19 => *b == b'Z',
        _ => b.is_ascii_digit(),
    })
}

pub fn is_timestamp(value: &str) -> bool {
    parse_timestamp(value).is_some()
}

/// Parse a strictly-shaped timestamp into a UTC instant.
///
/// Returns `None` for anything that is not exactly `YYYY-MM-DDThh:mm:ssZ`
/// or that names a date which does not exist (e.g. February 30th).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if !is_timestamp_shape(value) {
        return None;
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Non-empty, no forbidden characters, no control characters.
pub fn is_file_name(value: &str) -> bool {
    forbidden_file_name_char(value).is_none() && !value.is_empty()
}

fn forbidden_file_name_char(value: &str) -> Option<char> {
    value
        .chars()
        .find(|ch| FORBIDDEN_FILENAME_CHARS.contains(ch) || ch.is_control())
}

/// Identifiers are case-insensitive: ledger keys use the lowercase form.
pub fn canonical_key_field(value: &str) -> String {
    value.to_lowercase()
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

fn validate_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if within_length(value, min, max) {
        Ok(())
    } else {
        Err(ValidationError::Length {
            field,
            min,
            max,
            actual: value.chars().count(),
        })
    }
}

fn validate_name_field(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    validate_length(field, value, min, max)?;
    if !is_name(value) {
        return Err(ValidationError::Charset { field });
    }
    Ok(())
}

/// A user id, or any field that refers to one (dataset owner, record user).
pub fn validate_user_id(field: &'static str, value: &str) -> Result<(), ValidationError> {
    validate_name_field(field, value, USER_ID_MIN_LEN, USER_ID_MAX_LEN)
}

/// User display names follow the same rules as ids.
pub fn validate_user_name(value: &str) -> Result<(), ValidationError> {
    validate_name_field("user name", value, USER_ID_MIN_LEN, USER_ID_MAX_LEN)
}

pub fn validate_dataset_name(value: &str) -> Result<(), ValidationError> {
    validate_name_field(
        "dataset name",
        value,
        DATASET_NAME_MIN_LEN,
        DATASET_NAME_MAX_LEN,
    )
}

pub fn validate_file_hash(value: &str) -> Result<(), ValidationError> {
    if is_sha256_hex(value) {
        Ok(())
    } else {
        Err(ValidationError::Sha256 {
            field: "file hash",
            value: value.to_string(),
        })
    }
}

pub fn validate_file_size(size: i64) -> Result<(), ValidationError> {
    if within_range(size, 0, MAX_FILE_SIZE) {
        Ok(())
    } else {
        Err(ValidationError::Range {
            field: "file size",
            min: 0,
            max: MAX_FILE_SIZE,
            actual: size,
        })
    }
}

/// Parse a decimal size argument, then range-check it.
pub fn parse_file_size(value: &str) -> Result<i64, ValidationError> {
    let size = value
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger {
            field: "file size",
            value: value.to_string(),
        })?;
    validate_file_size(size)?;
    Ok(size)
}

pub fn validate_file_name(value: &str) -> Result<(), ValidationError> {
    validate_length("filename", value, FILENAME_MIN_LEN, FILENAME_MAX_LEN)?;
    if let Some(ch) = forbidden_file_name_char(value) {
        return Err(ValidationError::ForbiddenChar {
            field: "filename",
            ch,
        });
    }
    Ok(())
}

pub fn validate_timestamp(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if is_timestamp(value) {
        Ok(())
    } else {
        Err(ValidationError::Timestamp {
            field,
            value: value.to_string(),
        })
    }
}

pub fn validate_rows(rows: i64) -> Result<(), ValidationError> {
    if rows >= 0 {
        Ok(())
    } else {
        Err(ValidationError::Range {
            field: "rows",
            min: 0,
            max: i64::MAX,
            actual: rows,
        })
    }
}

pub fn validate_change_log(value: &str) -> Result<(), ValidationError> {
    validate_length("change log", value, 0, CHANGE_LOG_MAX_LEN)
}
