use std::sync::Arc;

use crate::error::StoreResult;

/// The platform's key/value primitives, as seen by the registry.
///
/// Implementations must satisfy:
/// - `get_state` returns `Ok(None)` for absent keys, never an error.
/// - `put_state` replaces any existing value wholesale.
/// - `scan_prefix` returns every live key starting with `prefix`, in no
///   particular order.
/// - Errors from the platform are propagated, never swallowed.
pub trait KeyValueLedger: Send + Sync {
    /// Read the value stored under `key`.
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Remove `key`. Removing an absent key is a no-op.
    fn delete_state(&self, key: &str) -> StoreResult<()>;

    /// All `(key, value)` pairs whose key starts with `prefix`.
    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>>;

    /// Returns `true` if `key` holds a value.
    ///
    /// Default implementation reads the value. Backends may override.
    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_state(key)?.is_some())
    }
}

impl<L: KeyValueLedger + ?Sized> KeyValueLedger for Arc<L> {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        (**self).put_state(key, value)
    }

    fn delete_state(&self, key: &str) -> StoreResult<()> {
        (**self).delete_state(key)
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        (**self).scan_prefix(prefix)
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        (**self).contains_key(key)
    }
}
