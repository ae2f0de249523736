//! sled-backed storage engine.

use std::path::{Path, PathBuf};

use sled::transaction::{
    ConflictableTransactionError, TransactionError, TransactionalTree, UnabortableTransactionError,
};

use crate::error::{KeystoreError, Result};
use crate::storage::backend::{OrderedStore, StoreTransaction, TxError};

/// File sled creates inside its directory once a database exists.
const SLED_DB_FILE: &str = "db";

/// An [`OrderedStore`] persisted in a sled database directory.
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SledStore {
    /// Open the database at `path`, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::Config::new()
            .path(path)
            .open()
            .map_err(|e| KeystoreError::Open(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Open an existing database at `path`, failing if none exists.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !Self::exists(path) {
            return Err(KeystoreError::Open(format!(
                "{}: no keystore at this path",
                path.display()
            )));
        }
        Self::open(path)
    }

    /// Whether a sled database has been created at `path`.
    pub fn exists(path: &Path) -> bool {
        path.join(SLED_DB_FILE).is_file()
    }

    /// The database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct SledTransaction<'a> {
    tree: &'a TransactionalTree,
}

fn tx_error(err: UnabortableTransactionError) -> TxError {
    match err {
        UnabortableTransactionError::Conflict => TxError::Conflict,
        UnabortableTransactionError::Storage(e) => TxError::Storage(e.to_string()),
    }
}

fn conflictable(err: TxError) -> ConflictableTransactionError<KeystoreError> {
    match err {
        TxError::Conflict => ConflictableTransactionError::Conflict,
        TxError::Abort(e) => ConflictableTransactionError::Abort(e),
        TxError::Storage(msg) => ConflictableTransactionError::Abort(KeystoreError::Store(msg)),
    }
}

impl StoreTransaction for SledTransaction<'_> {
    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, TxError> {
        self.tree
            .get(key)
            .map(|value| value.map(|v| v.to_vec()))
            .map_err(tx_error)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> std::result::Result<(), TxError> {
        self.tree.insert(key, value).map(|_| ()).map_err(tx_error)
    }

    fn delete(&self, key: &[u8]) -> std::result::Result<(), TxError> {
        self.tree.remove(key).map(|_| ()).map_err(tx_error)
    }
}

impl OrderedStore for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map(|value| value.map(|v| v.to_vec()))
            .map_err(|e| KeystoreError::Store(format!("Failed to get: {}", e)))
    }

    fn contains(&self, key: &[u8]) -> Result<bool> {
        self.db
            .contains_key(key)
            .map_err(|e| KeystoreError::Store(format!("Failed to check key: {}", e)))
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: Fn(&dyn StoreTransaction) -> std::result::Result<T, TxError>,
    {
        let result = self
            .db
            .transaction(|tree: &TransactionalTree| {
                f(&SledTransaction { tree }).map_err(conflictable)
            });

        result.map_err(|err| match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => {
                KeystoreError::Store(format!("Transaction failed: {}", e))
            }
        })
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.db
            .scan_prefix(prefix)
            .keys()
            .map(|key| {
                key.map(|k| k.to_vec())
                    .map_err(|e| KeystoreError::Store(format!("Iterator error: {}", e)))
            })
            .collect()
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| KeystoreError::Store(format!("Failed to flush: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, SledStore) {
        let dir = TempDir::new().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_transaction_commit() {
        let (_dir, store) = temp_store();

        store
            .transaction(|tx| {
                tx.put(b"a", b"1")?;
                tx.put(b"b", b"2")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_transaction_abort_rolls_back() {
        let (_dir, store) = temp_store();

        let result: Result<()> = store.transaction(|tx| {
            tx.put(b"a", b"1")?;
            Err(TxError::Abort(KeystoreError::KeyAlreadyExists("a".to_string())))
        });

        assert!(matches!(result, Err(KeystoreError::KeyAlreadyExists(_))));
        assert!(!store.contains(b"a").unwrap());
    }

    #[test]
    fn test_transaction_reads_own_writes() {
        let (_dir, store) = temp_store();

        let seen = store
            .transaction(|tx| {
                tx.put(b"a", b"1")?;
                tx.get(b"a")
            })
            .unwrap();

        assert_eq!(seen, Some(b"1".to_vec()));
    }

    #[test]
    fn test_scan_prefix() {
        let (_dir, store) = temp_store();

        store
            .transaction(|tx| {
                tx.put(b"keys/b", b"")?;
                tx.put(b"keys/a", b"")?;
                tx.put(b"other/c", b"")?;
                Ok(())
            })
            .unwrap();

        let keys = store.scan_prefix(b"keys/").unwrap();
        assert_eq!(keys, vec![b"keys/a".to_vec(), b"keys/b".to_vec()]);
    }

    #[test]
    fn test_exists_and_open_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");

        assert!(!SledStore::exists(&path));
        assert!(matches!(
            SledStore::open_existing(&path),
            Err(KeystoreError::Open(_))
        ));

        {
            let store = SledStore::open(&path).unwrap();
            store.flush().unwrap();
        }

        assert!(SledStore::exists(&path));
        assert!(SledStore::open_existing(&path).is_ok());
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();

        {
            let store = SledStore::open(dir.path()).unwrap();
            store.transaction(|tx| tx.put(b"key", b"value")).unwrap();
            store.flush().unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(b"value".to_vec()));
    }
}
