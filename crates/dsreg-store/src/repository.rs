use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::StoreResult;
use crate::key::CompositeKey;
use crate::traits::KeyValueLedger;

/// Typed view over one entity tag of a [`KeyValueLedger`].
///
/// Values are stored as full JSON snapshots. `put` is a last-write-wins
/// upsert; callers that must not overwrite check `exists` first. There is
/// no locking: multi-entity operations sequence their own reads and writes.
pub struct EntityRepository<T, L: ?Sized> {
    ledger: Arc<L>,
    tag: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T, L> EntityRepository<T, L>
where
    T: Serialize + DeserializeOwned,
    L: KeyValueLedger + ?Sized,
{
    pub fn new(ledger: Arc<L>, tag: &'static str) -> Self {
        Self {
            ledger,
            tag,
            _entity: PhantomData,
        }
    }

    /// The entity tag every key of this repository starts with.
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn key<S: AsRef<str>>(&self, fields: &[S]) -> StoreResult<CompositeKey> {
        Ok(CompositeKey::new(self.tag, fields)?)
    }

    pub fn exists<S: AsRef<str>>(&self, fields: &[S]) -> StoreResult<bool> {
        let key = self.key(fields)?;
        self.ledger.contains_key(key.as_str())
    }

    /// Read and decode the entity stored under `fields`.
    ///
    /// Returns `Ok(None)` if no such entity exists.
    pub fn get<S: AsRef<str>>(&self, fields: &[S]) -> StoreResult<Option<T>> {
        let key = self.key(fields)?;
        debug!(key = %key, "get");
        match self.ledger.get_state(key.as_str())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write the full snapshot of `entity` under `fields`.
    pub fn put<S: AsRef<str>>(&self, entity: &T, fields: &[S]) -> StoreResult<()> {
        let key = self.key(fields)?;
        let bytes = serde_json::to_vec(entity)?;
        debug!(key = %key, bytes = bytes.len(), "put");
        self.ledger.put_state(key.as_str(), bytes)
    }

    /// Every entity whose key starts with `partial` fields. Order unspecified.
    pub fn query_by_prefix<S: AsRef<str>>(&self, partial: &[S]) -> StoreResult<Vec<T>> {
        let prefix = self.key(partial)?;
        let entries = self.ledger.scan_prefix(prefix.as_str())?;
        debug!(prefix = %prefix, count = entries.len(), "query by prefix");
        entries
            .into_iter()
            .map(|(_, bytes)| Ok(serde_json::from_slice(&bytes)?))
            .collect()
    }

    /// Every entity under this tag. Order unspecified.
    pub fn query_all(&self) -> StoreResult<Vec<T>> {
        self.query_by_prefix::<&str>(&[])
    }
}

impl<T, L: ?Sized> Clone for EntityRepository<T, L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            tag: self.tag,
            _entity: PhantomData,
        }
    }
}

impl<T, L: ?Sized> std::fmt::Debug for EntityRepository<T, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRepository")
            .field("tag", &self.tag)
            .finish()
    }
}
