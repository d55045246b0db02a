//! Key/value ledger boundary for the dataset registry.
//!
//! The ledger platform is treated as an opaque key/value service: get, put,
//! delete by key, and prefix scan. This crate wraps that service in three
//! layers:
//!
//! - [`CompositeKey`] -- injective, prefix-scannable encoding of
//!   `(entity tag, field...)` tuples
//! - [`KeyValueLedger`] -- the narrow platform interface
//! - [`EntityRepository`] -- typed get/exists/put/query-by-prefix over JSON
//!   snapshots
//!
//! # Backends
//!
//! - [`InMemoryKvLedger`] -- `BTreeMap`-based ledger for tests and embedding,
//!   with fault injection
//! - [`Transaction`] -- optimistic-concurrency view over an
//!   [`InMemoryKvLedger`] that records its read set and rejects stale commits
//!
//! # Design Rules
//!
//! 1. One key per entity instance; the value is the full JSON snapshot.
//! 2. Writes replace values wholesale. There are no partial updates.
//! 3. Prefix scan order is unspecified at this boundary.
//! 4. Nothing here retries; platform rejections surface unchanged.

pub mod error;
pub mod key;
pub mod memory;
pub mod repository;
pub mod traits;
pub mod transaction;

pub use error::{KeyError, StoreError, StoreResult};
pub use key::CompositeKey;
pub use memory::InMemoryKvLedger;
pub use repository::EntityRepository;
pub use traits::KeyValueLedger;
pub use transaction::Transaction;
