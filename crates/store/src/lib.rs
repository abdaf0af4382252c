//! Key-value store abstractions backing the IBC core engine.
//!
//! The engine keeps all of its state, and the state of every light client
//! and application module it drives, in a single [`Store`]. Writes made
//! during a transaction go through a [`CacheStore`], which is only flushed
//! to the underlying store once the transaction succeeds.

pub mod cache;
pub mod memory;
pub mod namespaced;

#[doc(inline)]
pub use ibc_engine_types::BoxError;

#[doc(inline)]
pub use self::cache::CacheStore;
#[doc(inline)]
pub use self::memory::MemoryStore;
#[doc(inline)]
pub use self::namespaced::NamespacedStore;

/// Read access to a key-value store.
pub trait ReadStore {
    /// Read some value from the store. Missing keys yield `None`.
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BoxError>;

    /// Check whether `key` holds a value.
    #[inline]
    fn has(&self, key: &[u8]) -> Result<bool, BoxError> {
        self.read(key).map(|value| value.is_some())
    }
}

/// Read and write access to a key-value store.
pub trait Store: ReadStore {
    /// Write some value to the store, overwriting any previous value.
    fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), BoxError>;

    /// Delete the value at `key`, if any.
    fn delete(&mut self, key: &[u8]) -> Result<(), BoxError>;
}

impl<S: ReadStore + ?Sized> ReadStore for &S {
    #[inline]
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BoxError> {
        (**self).read(key)
    }
}

impl<S: ReadStore + ?Sized> ReadStore for &mut S {
    #[inline]
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BoxError> {
        (**self).read(key)
    }
}

impl<S: Store + ?Sized> Store for &mut S {
    #[inline]
    fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), BoxError> {
        (**self).write(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<(), BoxError> {
        (**self).delete(key)
    }
}

impl<S: ReadStore + ?Sized> ReadStore for Box<S> {
    #[inline]
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BoxError> {
        (**self).read(key)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    #[inline]
    fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), BoxError> {
        (**self).write(key, value)
    }

    #[inline]
    fn delete(&mut self, key: &[u8]) -> Result<(), BoxError> {
        (**self).delete(key)
    }
}
