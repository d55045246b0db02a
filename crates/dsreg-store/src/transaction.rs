//! Optimistic-concurrency transactions over [`InMemoryKvLedger`].
//!
//! A [`Transaction`] simulates one proposed ledger transaction: reads go to
//! the committed state and record the version they observed; writes are
//! buffered. At [`Transaction::commit`] the read set is validated against the
//! current versions and the whole write set is applied at once, or rejected
//! with [`StoreError::CommitConflict`] if any read key moved in the meantime.
//!
//! Reads see the transaction's own buffered writes. Range reads record the
//! keys they returned but do not detect keys inserted later (no phantom
//! protection).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryKvLedger;
use crate::traits::KeyValueLedger;

pub struct Transaction {
    id: Uuid,
    base: Arc<InMemoryKvLedger>,
    state: Mutex<TxState>,
}

#[derive(Default)]
struct TxState {
    read_set: BTreeMap<String, u64>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    closed: bool,
}

impl Transaction {
    pub(crate) fn new(base: Arc<InMemoryKvLedger>) -> Self {
        let id = Uuid::now_v7();
        debug!(tx = %id, "transaction opened");
        Self {
            id,
            base,
            state: Mutex::new(TxState::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn open_state(&self) -> StoreResult<MutexGuard<'_, TxState>> {
        let state = self
            .state
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        if state.closed {
            return Err(StoreError::TransactionClosed(self.id));
        }
        Ok(state)
    }

    /// Number of distinct keys read from committed state.
    pub fn read_set_len(&self) -> StoreResult<usize> {
        Ok(self.open_state()?.read_set.len())
    }

    /// Number of distinct keys with a buffered write.
    pub fn write_set_len(&self) -> StoreResult<usize> {
        Ok(self.open_state()?.writes.len())
    }

    /// Validate the read set and apply every buffered write.
    ///
    /// The transaction is closed afterwards whether or not the commit
    /// succeeded. A rejected transaction must be re-run from scratch.
    pub fn commit(&self) -> StoreResult<()> {
        let mut state = self.open_state()?;
        state.closed = true;
        let writes = std::mem::take(&mut state.writes);
        let write_count = writes.len();

        match self.base.commit_versioned(&state.read_set, writes) {
            Ok(()) => {
                debug!(tx = %self.id, writes = write_count, "transaction committed");
                Ok(())
            }
            Err(e) => {
                debug!(tx = %self.id, error = %e, "transaction rejected");
                Err(e)
            }
        }
    }

    /// Drop every buffered write and close the transaction.
    pub fn abort(&self) -> StoreResult<()> {
        let mut state = self.open_state()?;
        state.closed = true;
        state.writes.clear();
        debug!(tx = %self.id, "transaction aborted");
        Ok(())
    }
}

impl KeyValueLedger for Transaction {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut state = self.open_state()?;
        if let Some(buffered) = state.writes.get(key) {
            return Ok(buffered.clone());
        }
        let (value, version) = self.base.get_versioned(key)?;
        state.read_set.entry(key.to_string()).or_insert(version);
        Ok(value)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> StoreResult<()> {
        self.open_state()?
            .writes
            .insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete_state(&self, key: &str) -> StoreResult<()> {
        self.open_state()?.writes.insert(key.to_string(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let mut state = self.open_state()?;
        let mut merged = BTreeMap::new();
        for (key, value, version) in self.base.scan_versioned(prefix)? {
            state.read_set.entry(key.clone()).or_insert(version);
            merged.insert(key, value);
        }
        for (key, buffered) in state.writes.iter() {
            if !key.starts_with(prefix) {
                continue;
            }
            match buffered {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(entries: &[(&str, &[u8])]) -> Arc<InMemoryKvLedger> {
        let ledger = Arc::new(InMemoryKvLedger::new());
        for (k, v) in entries {
            ledger.put_state(k, v.to_vec()).unwrap();
        }
        ledger
    }

    #[test]
    fn writes_are_invisible_until_commit() {
        let ledger = ledger_with(&[]);
        let tx = ledger.begin();
        tx.put_state("k", b"v".to_vec()).unwrap();

        assert_eq!(tx.get_state("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(ledger.get_state("k").unwrap(), None);

        tx.commit().unwrap();
        assert_eq!(ledger.get_state("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn scan_merges_buffered_writes() {
        let ledger = ledger_with(&[("p/a", b"1"), ("p/b", b"2")]);
        let tx = ledger.begin();
        tx.put_state("p/c", b"3".to_vec()).unwrap();
        tx.delete_state("p/a").unwrap();

        let keys: Vec<String> = tx
            .scan_prefix("p/")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["p/b".to_string(), "p/c".to_string()]);
    }

    #[test]
    fn stale_read_is_rejected() {
        let ledger = ledger_with(&[("count", b"0")]);

        let first = ledger.begin();
        let second = ledger.begin();
        assert_eq!(first.get_state("count").unwrap(), Some(b"0".to_vec()));
        assert_eq!(second.get_state("count").unwrap(), Some(b"0".to_vec()));

        second.put_state("count", b"1".to_vec()).unwrap();
        second.commit().unwrap();

        first.put_state("count", b"1".to_vec()).unwrap();
        assert!(matches!(
            first.commit(),
            Err(StoreError::CommitConflict { .. })
        ));
        assert_eq!(ledger.get_state("count").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn blind_writes_do_not_conflict() {
        let ledger = ledger_with(&[("k", b"0")]);
        let first = ledger.begin();
        let second = ledger.begin();
        first.put_state("k", b"1".to_vec()).unwrap();
        second.put_state("k", b"2".to_vec()).unwrap();
        first.commit().unwrap();
        second.commit().unwrap();
        assert_eq!(ledger.get_state("k").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn closed_transaction_rejects_use() {
        let ledger = ledger_with(&[]);
        let tx = ledger.begin();
        tx.commit().unwrap();
        assert!(matches!(
            tx.get_state("k"),
            Err(StoreError::TransactionClosed(id)) if id == tx.id()
        ));

        let aborted = ledger.begin();
        aborted.put_state("k", vec![1]).unwrap();
        aborted.abort().unwrap();
        assert!(aborted.commit().is_err());
        assert_eq!(ledger.get_state("k").unwrap(), None);
    }

    #[test]
    fn read_and_write_sets_are_tracked() {
        let ledger = ledger_with(&[("a", b"1"), ("b", b"2")]);
        let tx = ledger.begin();
        tx.get_state("a").unwrap();
        tx.get_state("missing").unwrap();
        tx.put_state("b", vec![3]).unwrap();
        assert_eq!(tx.read_set_len().unwrap(), 2);
        assert_eq!(tx.write_set_len().unwrap(), 1);
    }
}
