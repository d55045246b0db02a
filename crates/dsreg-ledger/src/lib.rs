//! Entity stores for the dataset registry.
//!
//! This crate layers validation and cross-entity checks on top of the
//! key/value boundary in `dsreg-store`. It provides:
//! - [`UserStore`], [`FileStore`], [`DatasetStore`], [`RecordStore`]
//! - [`MutationPlan`] -- the ordered write list behind every multi-key
//!   operation
//! - [`IntegrityAuditor`] -- read-only check of the cross-entity invariants
//! - [`EntityLedger`] -- all four stores sharing one injected ledger
//!
//! # Invariants
//!
//! After every successful operation:
//! 1. Every file referenced by a version or a record exists.
//! 2. A file's reference count equals the number of times live (non-deleted)
//!    dataset versions list its hash.
//! 3. Deleted datasets never gain versions.
//! 4. Creating an existing key is rejected, never merged.
//!
//! There are no multi-key transactions. Checks run before the first write;
//! a failure between writes of one operation is reported as
//! [`LedgerError::PartialCommit`] and is not rolled back.

pub mod audit;
pub mod config;
pub mod datasets;
pub mod error;
pub mod files;
pub mod ledger;
pub mod mutation;
pub mod records;
pub mod schema;
pub mod users;

pub use audit::{AuditReport, IntegrityAuditor, Violation, ViolationKind};
pub use config::LedgerConfig;
pub use datasets::DatasetStore;
pub use error::{EntityKind, ErrorKind, LedgerError, LedgerResult};
pub use files::FileStore;
pub use ledger::EntityLedger;
pub use mutation::{Expectation, MutationPlan, RecordIndex, StagedWrite};
pub use records::RecordStore;
pub use users::UserStore;
