use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueLedger;
use crate::transaction::Transaction;

/// In-memory, `BTreeMap`-based key/value ledger.
///
/// Intended for tests and embedding. Every write bumps a global sequence
/// number and stamps the written key with it, which is what
/// [`Transaction`] validates its read set against. Deleted keys keep their
/// version as a tombstone so a reader that saw the value can still detect
/// the removal.
pub struct InMemoryKvLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    slots: BTreeMap<String, Slot>,
    seq: u64,
    /// Successful puts remaining before injected failures start.
    puts_before_failure: Option<usize>,
}

struct Slot {
    value: Option<Vec<u8>>,
    version: u64,
}

impl InMemoryKvLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    /// Number of live keys.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.slots.values().filter(|s| s.value.is_some()).count())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted list of all live keys.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .read()?
            .slots
            .iter()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(key, _)| key.clone())
            .collect())
    }

    /// Let `n` more `put_state` calls succeed, then fail every later one
    /// with [`StoreError::Backend`].
    pub fn fail_after_puts(&self, n: usize) -> StoreResult<()> {
        self.write()?.puts_before_failure = Some(n);
        Ok(())
    }

    /// Disable injected failures.
    pub fn clear_faults(&self) -> StoreResult<()> {
        self.write()?.puts_before_failure = None;
        Ok(())
    }

    /// Open an optimistic-concurrency transaction over this ledger.
    pub fn begin(self: &Arc<Self>) -> Transaction {
        Transaction::new(Arc::clone(self))
    }

    /// Version stamp of `key`; `0` if it was never written.
    #[cfg(test)]
    pub(crate) fn version_of(&self, key: &str) -> StoreResult<u64> {
        Ok(self.read()?.slots.get(key).map_or(0, |s| s.version))
    }

    /// Values and versions of every live key under `prefix`.
    pub(crate) fn scan_versioned(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>, u64)>> {
        let state = self.read()?;
        Ok(state
            .slots
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter_map(|(key, slot)| {
                slot.value
                    .as_ref()
                    .map(|value| (key.clone(), value.clone(), slot.version))
            })
            .collect())
    }

    /// Value and version of `key` read under one lock.
    pub(crate) fn get_versioned(&self, key: &str) -> StoreResult<(Option<Vec<u8>>, u64)> {
        let state = self.read()?;
        Ok(state
            .slots
            .get(key)
            .map_or((None, 0), |slot| (slot.value.clone(), slot.version)))
    }

    /// Validate `read_set` and apply `writes` atomically.
    ///
    /// Fails with [`StoreError::CommitConflict`] naming the first key whose
    /// version moved since it was read; nothing is written in that case.
    pub(crate) fn commit_versioned(
        &self,
        read_set: &BTreeMap<String, u64>,
        writes: BTreeMap<String, Option<Vec<u8>>>,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        for (key, seen) in read_set {
            let current = state.slots.get(key).map_or(0, |s| s.version);
            if current != *seen {
                return Err(StoreError::CommitConflict {
                    key: key.escape_debug().to_string(),
                });
            }
        }
        for (key, value) in writes {
            state.seq += 1;
            let version = state.seq;
            state.slots.insert(key, Slot { value, version });
        }
        Ok(())
    }
}

impl Default for InMemoryKvLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueLedger for InMemoryKvLedger {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.read()?.slots.get(key).and_then(|s| s.value.clone()))
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        let mut state = self.write()?;
        if let Some(remaining) = state.puts_before_failure {
            if remaining == 0 {
                return Err(StoreError::Backend(format!(
                    "injected failure writing {}",
                    key.escape_debug()
                )));
            }
            state.puts_before_failure = Some(remaining - 1);
        }
        state.seq += 1;
        let version = state.seq;
        state.slots.insert(
            key.to_string(),
            Slot {
                value: Some(value),
                version,
            },
        );
        Ok(())
    }

    fn delete_state(&self, key: &str) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.slots.get(key).is_some_and(|s| s.value.is_some()) {
            state.seq += 1;
            let version = state.seq;
            state.slots.insert(
                key.to_string(),
                Slot {
                    value: None,
                    version,
                },
            );
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        Ok(self
            .scan_versioned(prefix)?
            .into_iter()
            .map(|(key, value, _)| (key, value))
            .collect())
    }
}

impl std::fmt::Debug for InMemoryKvLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryKvLedger")
            .field("key_count", &count)
            .finish()
    }
}
