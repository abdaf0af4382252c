use std::collections::BTreeMap;

use crate::{BoxError, ReadStore, Store};

/// Write-buffering layer over a read-only store.
///
/// Reads see the buffered writes first, then fall through to the base
/// store. Nothing reaches the base store until [`CacheStore::into_pending`]
/// is applied with [`flush`]; dropping the cache discards every write.
#[derive(Debug)]
pub struct CacheStore<'base, S: ?Sized> {
    base: &'base S,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

/// Buffered writes of a [`CacheStore`]. `None` marks a deletion.
pub type PendingWrites = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

impl<'base, S: ReadStore + ?Sized> CacheStore<'base, S> {
    pub fn new(base: &'base S) -> Self {
        Self {
            base,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and deletions.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consume the cache, returning its buffered writes.
    pub fn into_pending(self) -> PendingWrites {
        self.pending
    }
}

impl<S: ReadStore + ?Sized> ReadStore for CacheStore<'_, S> {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BoxError> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.read(key),
        }
    }
}

impl<S: ReadStore + ?Sized> Store for CacheStore<'_, S> {
    fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), BoxError> {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), BoxError> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }
}

/// Apply buffered writes to `store`.
pub fn flush<S: Store + ?Sized>(store: &mut S, pending: PendingWrites) -> Result<(), BoxError> {
    tracing::trace!(writes = pending.len(), "flushing buffered writes");

    for (key, value) in pending {
        match value {
            Some(value) => store.write(&key, &value)?,
            None => store.delete(&key)?,
        }
    }
    Ok(())
}
