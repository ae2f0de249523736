//! In-memory storage engine.
//!
//! Nothing survives the process. Useful for tests and for callers that want
//! an ephemeral keystore with the same semantics as the on-disk one.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{KeystoreError, Result};
use crate::storage::backend::{OrderedStore, StoreTransaction, TxError};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// An [`OrderedStore`] held in a `BTreeMap`.
///
/// Transactions run under a single lock against a staged copy of the map,
/// which replaces the live map only if the closure succeeds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<Map>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Map> {
        // The live map only changes by whole-map swap; a poisoned map is consistent.
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct MemoryTransaction {
    staged: RefCell<Map>,
}

impl StoreTransaction for MemoryTransaction {
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, TxError> {
        Ok(self.staged.borrow().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> std::result::Result<(), TxError> {
        self.staged.borrow_mut().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> std::result::Result<(), TxError> {
        self.staged.borrow_mut().remove(key);
        Ok(())
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.lock().contains_key(key))
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: Fn(&dyn StoreTransaction) -> std::result::Result<T, TxError>,
    {
        let mut map = self.lock();
        let tx = MemoryTransaction {
            staged: RefCell::new(map.clone()),
        };

        match f(&tx) {
            Ok(value) => {
                *map = tx.staged.into_inner();
                Ok(value)
            }
            Err(TxError::Abort(e)) => Err(e),
            Err(TxError::Storage(msg)) => Err(KeystoreError::Store(msg)),
            // The lock is held for the whole transaction, so no other writer exists
            Err(TxError::Conflict) => Err(KeystoreError::Store(
                "Unexpected transaction conflict".to_string(),
            )),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .lock()
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_commit() {
        let store = MemoryStore::new();

        store.transaction(|tx| tx.put(b"a", b"1")).unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(store.contains(b"a").unwrap());
    }

    #[test]
    fn test_transaction_abort_rolls_back() {
        let store = MemoryStore::new();
        store.transaction(|tx| tx.put(b"keep", b"1")).unwrap();

        let result: Result<()> = store.transaction(|tx| {
            tx.delete(b"keep")?;
            tx.put(b"new", b"2")?;
            Err(TxError::Abort(KeystoreError::ReadOnly))
        });

        assert!(matches!(result, Err(KeystoreError::ReadOnly)));
        assert!(store.contains(b"keep").unwrap());
        assert!(!store.contains(b"new").unwrap());
    }

    #[test]
    fn test_scan_prefix_ordered() {
        let store = MemoryStore::new();
        store
            .transaction(|tx| {
                tx.put(b"keys/c", b"")?;
                tx.put(b"keys/a", b"")?;
                tx.put(b"keyz", b"")?;
                tx.put(b"a", b"")?;
                Ok(())
            })
            .unwrap();

        let keys = store.scan_prefix(b"keys/").unwrap();
        assert_eq!(keys, vec![b"keys/a".to_vec(), b"keys/c".to_vec()]);
    }

    #[test]
    fn test_delete_absent_is_ok() {
        let store = MemoryStore::new();
        assert!(store.transaction(|tx| tx.delete(b"missing")).is_ok());
    }
}
