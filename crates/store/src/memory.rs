use std::collections::BTreeMap;

use crate::{BoxError, ReadStore, Store};

/// In-memory store, backed by a [`BTreeMap`].
#[derive(Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryStore {
    btreemap: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Iterate over all key-value pairs, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.btreemap
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.btreemap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.btreemap.is_empty()
    }
}

impl ReadStore for MemoryStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BoxError> {
        Ok(self.btreemap.get(key).cloned())
    }
}

impl Store for MemoryStore {
    fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), BoxError> {
        self.btreemap.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), BoxError> {
        self.btreemap.remove(key);
        Ok(())
    }
}
