use crate::{BoxError, ReadStore, Store};

/// Store implementation whose keys are namespaced.
///
/// Every light client and application module is handed a namespaced view
/// of the engine's store, so that they can never clobber each other's keys,
/// nor the engine's own.
#[derive(Debug)]
pub struct NamespacedStore<'namespace, S> {
    namespace: &'namespace str,
    store: S,
}

impl<'namespace, S> NamespacedStore<'namespace, S> {
    /// Create a new namespaced key-value store, wrapping an
    /// existing store implementation.
    pub const fn new(namespace: &'namespace str, store: S) -> Self {
        Self { namespace, store }
    }

    /// Return the namespace of this [`NamespacedStore`].
    pub fn namespace(&self) -> &'namespace str {
        self.namespace
    }

    /// Return a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Return a mutable reference to the inner store.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn namespaced_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.namespace.len() + 1 + key.len());
        full.extend_from_slice(self.namespace.as_bytes());
        full.push(b'/');
        full.extend_from_slice(key);
        full
    }
}

impl<S: ReadStore> ReadStore for NamespacedStore<'_, S> {
    #[inline]
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BoxError> {
        self.store.read(&self.namespaced_key(key))
    }
}

impl<S: Store> Store for NamespacedStore<'_, S> {
    #[inline]
    fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), BoxError> {
        let key = self.namespaced_key(key);
        self.store.write(&key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<(), BoxError> {
        let key = self.namespaced_key(key);
        self.store.delete(&key)
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn keys_are_prefixed_with_the_namespace() {
        let mut store = MemoryStore::default();
        let mut light_client = NamespacedStore::new("lightclients/tendermint", &mut store);

        light_client
            .write(b"clients/tendermint-0/latestHeight", b"0-10")
            .unwrap();
        light_client
            .write(b"clients/tendermint-1/latestHeight", b"0-3")
            .unwrap();

        assert_eq!(
            light_client
                .read(b"clients/tendermint-0/latestHeight")
                .unwrap()
                .as_deref(),
            Some(&b"0-10"[..])
        );
        assert_eq!(light_client.namespace(), "lightclients/tendermint");
        assert_eq!(
            store
                .read(b"lightclients/tendermint/clients/tendermint-1/latestHeight")
                .unwrap(),
            Some(b"0-3".to_vec())
        );
        assert!(store
            .iter()
            .all(|(key, _)| key.starts_with(b"lightclients/tendermint/")));
    }

    #[test]
    fn namespaces_do_not_overlap() {
        let mut store = MemoryStore::default();

        NamespacedStore::new("a", &mut store)
            .write(b"key", b"1")
            .unwrap();
        NamespacedStore::new("b", &mut store)
            .write(b"key", b"2")
            .unwrap();
        NamespacedStore::new("a", &mut store).delete(b"key").unwrap();

        assert!(!NamespacedStore::new("a", &store).has(b"key").unwrap());
        assert_eq!(
            NamespacedStore::new("b", &store).read(b"key").unwrap(),
            Some(b"2".to_vec())
        );
    }
}
