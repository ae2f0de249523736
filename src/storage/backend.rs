//! Ordered transactional storage engines.
//!
//! The keystore does not depend on a concrete database. Any engine that can
//! run get/put/delete atomically inside a transaction and scan keys by
//! prefix implements [`OrderedStore`].

use crate::error::{KeystoreError, Result};

/// Failure inside a transaction closure.
#[derive(Debug)]
pub enum TxError {
    /// A concurrent writer touched the same keys. The engine retries the closure.
    Conflict,
    /// Roll back and return this error to the caller.
    Abort(KeystoreError),
    /// The engine failed while reading or writing.
    Storage(String),
}

impl From<KeystoreError> for TxError {
    fn from(err: KeystoreError) -> Self {
        TxError::Abort(err)
    }
}

/// Reads and writes that commit together.
pub trait StoreTransaction {
    /// Read a value, observing this transaction's own writes.
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, TxError>;

    /// Write a value.
    fn put(&self, key: &[u8], value: &[u8]) -> std::result::Result<(), TxError>;

    /// Remove a value. Removing an absent key is not an error.
    fn delete(&self, key: &[u8]) -> std::result::Result<(), TxError>;
}

/// A persistent (or in-memory) ordered key-value engine.
pub trait OrderedStore: Send + Sync {
    /// Read a single value outside any transaction.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Check for a key outside any transaction.
    fn contains(&self, key: &[u8]) -> Result<bool>;

    /// Run `f` in one atomic transaction.
    ///
    /// Either every write made by `f` becomes visible or none does. `f`
    /// may be invoked more than once if the engine detects a conflict, so
    /// it must not have side effects outside the transaction.
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: Fn(&dyn StoreTransaction) -> std::result::Result<T, TxError>;

    /// All keys that start with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>>;

    /// Make all committed writes durable.
    fn flush(&self) -> Result<()>;
}
