//! Foundation types for the dataset registry.
//!
//! This crate provides the entity model stored on the ledger and the pure
//! validation predicates every mutation runs before touching state. Every
//! other dsreg crate depends on `dsreg-types`.
//!
//! # Key Types
//!
//! - [`User`] -- account identified by a case-insensitive id
//! - [`File`] -- content-addressed file with a reference count
//! - [`Dataset`] -- append-only list of [`Version`]s with a soft-delete flag
//! - [`Record`] -- immutable download record
//! - [`ValidationError`] -- every way an input can be malformed

pub mod dataset;
pub mod error;
pub mod file;
pub mod hash;
pub mod record;
pub mod user;
pub mod validation;

pub use dataset::{Dataset, DatasetFile, DatasetState, Version};
pub use error::ValidationError;
pub use file::File;
pub use hash::sha256_hex;
pub use record::Record;
pub use user::User;
