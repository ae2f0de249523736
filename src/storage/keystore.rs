//! Encrypted keystore.
//!
//! Records are stored under `keys/<name>` in an [`OrderedStore`]. Every
//! value is a ciphertext blob produced by the keystore's
//! [`EncryptionManager`]; names are validated before any storage access.
//!
//! A keystore is `Open` from construction until [`Keystore::close`]. After
//! that every operation fails with [`KeystoreError::StoreClosed`].
//!
//! The Argon2id parameters a store was created with are kept in a metadata
//! record outside the key namespace, so reopening needs only the passphrase.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::KeystoreOpts;
use crate::crypto::ed25519::KeyMaterial;
use crate::crypto::encryption::EncryptionManager;
use crate::crypto::password::KdfParams;
use crate::error::{KeystoreError, Result};
use crate::storage::backend::{OrderedStore, TxError};
use crate::storage::name::validate_name;
use crate::storage::sled_store::SledStore;

/// Prefix of every record key inside the store.
pub const KEY_NAMESPACE: &[u8] = b"keys/";

/// Metadata record holding the store's [`KdfParams`] as JSON.
pub const KDF_PARAMS_KEY: &[u8] = b"meta/kdf";

fn record_key(name: &str) -> Vec<u8> {
    [KEY_NAMESPACE, name.as_bytes()].concat()
}

fn decode_kdf_params(bytes: &[u8]) -> Result<KdfParams> {
    serde_json::from_slice(bytes)
        .map_err(|e| KeystoreError::Open(format!("Invalid KDF metadata: {}", e)))
}

/// Parameters recorded in `store`, recording `requested` first if the store
/// has none and may be written.
fn load_or_init_kdf<S: OrderedStore>(
    store: &S,
    requested: KdfParams,
    read_only: bool,
) -> Result<KdfParams> {
    if let Some(bytes) = store.get(KDF_PARAMS_KEY)? {
        return decode_kdf_params(&bytes);
    }
    if read_only {
        return Ok(requested);
    }

    let encoded = serde_json::to_vec(&requested)?;
    store.transaction(|tx| match tx.get(KDF_PARAMS_KEY)? {
        Some(bytes) => decode_kdf_params(&bytes).map_err(TxError::Abort),
        None => {
            tx.put(KDF_PARAMS_KEY, &encoded)?;
            Ok(requested)
        }
    })
}

/// A passphrase-encrypted store of named secrets.
pub struct Keystore<S: OrderedStore = SledStore> {
    /// `None` once closed.
    store: RwLock<Option<S>>,
    manager: EncryptionManager,
    read_only: bool,
    path: Option<PathBuf>,
}

impl<S: OrderedStore> std::fmt::Debug for Keystore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keystore")
            .field("path", &self.path)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl Keystore<SledStore> {
    /// Open or create a keystore on disk.
    ///
    /// With `read_only` set, the store must already exist and `put`/`delete`
    /// are refused.
    ///
    /// `opts.kdf` only applies when the store is created. An existing store
    /// is always read with the parameters recorded in it.
    ///
    /// sled holds an exclusive lock on its directory even for read-only
    /// handles, so a second keystore on the same path fails with
    /// [`KeystoreError::Open`] until the first is closed.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use keyvault::config::KeystoreOpts;
    /// use keyvault::storage::keystore::Keystore;
    ///
    /// # fn example() -> keyvault::error::Result<()> {
    /// let keystore = Keystore::open(KeystoreOpts::new("s3cr3t", "./keystore"))?;
    ///
    /// keystore.put("node-1", b"raw private key")?;
    /// assert_eq!(keystore.get("node-1")?.as_slice(), b"raw private key");
    ///
    /// keystore.close()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(opts: KeystoreOpts) -> Result<Self> {
        let store = if opts.read_only {
            SledStore::open_existing(&opts.storage_path)?
        } else {
            SledStore::open(&opts.storage_path)?
        };

        let mut keystore =
            Self::attach(store, opts.passphrase.as_bytes(), opts.kdf, opts.read_only)?;

        info!(
            path = %opts.storage_path.display(),
            read_only = opts.read_only,
            "Opened keystore"
        );

        keystore.path = Some(opts.storage_path);
        Ok(keystore)
    }
}

impl<S: OrderedStore> Keystore<S> {
    /// Build a keystore over an already-open storage engine, using the KDF
    /// parameters recorded in it.
    ///
    /// A writable store without recorded parameters gets `kdf` recorded.
    /// A read-only one is read with `kdf` as given.
    pub fn attach(
        store: S,
        passphrase: impl AsRef<[u8]>,
        kdf: KdfParams,
        read_only: bool,
    ) -> Result<Self> {
        let params = load_or_init_kdf(&store, kdf, read_only)?;
        if params != kdf {
            debug!(?params, "Using KDF parameters recorded in store");
        }

        Ok(Self::with_store(
            store,
            EncryptionManager::with_params(passphrase, params),
            read_only,
        ))
    }

    /// Build a keystore over an already-open storage engine with a
    /// ready-made manager. Nothing is read from or recorded in the store.
    pub fn with_store(store: S, manager: EncryptionManager, read_only: bool) -> Self {
        Self {
            store: RwLock::new(Some(store)),
            manager,
            read_only,
            path: None,
        }
    }

    /// Storage directory, for keystores opened from a path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether writes are refused.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn with_open_store<T>(&self, f: impl FnOnce(&S) -> Result<T>) -> Result<T> {
        let guard = self.store.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(store) => f(store),
            None => Err(KeystoreError::StoreClosed),
        }
    }

    fn with_writable_store<T>(&self, f: impl FnOnce(&S) -> Result<T>) -> Result<T> {
        self.with_open_store(|store| {
            if self.read_only {
                return Err(KeystoreError::ReadOnly);
            }
            f(store)
        })
    }

    /// Check whether a record exists under `name`.
    pub fn has(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        self.with_open_store(|store| store.contains(&record_key(name)))
    }

    /// Encrypt `payload` and store it under `name`.
    ///
    /// Fails with [`KeystoreError::KeyAlreadyExists`] if the name is taken;
    /// the existing record is left as it was.
    pub fn put(&self, name: &str, payload: &[u8]) -> Result<()> {
        validate_name(name)?;
        let key = record_key(name);

        self.with_writable_store(|store| {
            // Skip the KDF when the name is visibly taken; the transaction below re-checks.
            if store.contains(&key)? {
                return Err(KeystoreError::KeyAlreadyExists(name.to_string()));
            }

            let blob = self.manager.encrypt(payload)?;

            store.transaction(|tx| {
                if tx.get(&key)?.is_some() {
                    return Err(TxError::Abort(KeystoreError::KeyAlreadyExists(
                        name.to_string(),
                    )));
                }
                tx.put(&key, &blob)
            })
        })?;

        debug!(name = %name, "Stored key");
        Ok(())
    }

    /// Read and decrypt the record stored under `name`.
    pub fn get(&self, name: &str) -> Result<Zeroizing<Vec<u8>>> {
        validate_name(name)?;

        let blob = self
            .with_open_store(|store| store.get(&record_key(name)))?
            .ok_or_else(|| KeystoreError::KeyNotFound(name.to_string()))?;

        self.manager.decrypt(&blob)
    }

    /// Remove the record under `name`. Removing an absent name succeeds.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let key = record_key(name);

        self.with_writable_store(|store| store.transaction(|tx| tx.delete(&key)))?;

        debug!(name = %name, "Deleted key");
        Ok(())
    }

    /// Names of all stored records.
    ///
    /// Names come back in store key order, but callers should not rely on
    /// any particular order.
    pub fn list(&self) -> Result<Vec<String>> {
        let keys = self.with_open_store(|store| store.scan_prefix(KEY_NAMESPACE))?;

        keys.into_iter()
            .map(|key| {
                String::from_utf8(key[KEY_NAMESPACE.len()..].to_vec())
                    .map_err(|_| KeystoreError::Store("Stored key name is not UTF-8".to_string()))
            })
            .collect()
    }

    /// Flush and release the storage engine.
    ///
    /// Waits for in-flight operations. Every later call, including a second
    /// `close`, fails with [`KeystoreError::StoreClosed`].
    pub fn close(&self) -> Result<()> {
        let store = self
            .store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(KeystoreError::StoreClosed)?;

        store.flush()?;
        drop(store);

        info!(path = ?self.path, "Closed keystore");
        Ok(())
    }

    /// Store a typed key under `name`.
    pub fn put_key<K: KeyMaterial>(&self, name: &str, key: &K) -> Result<()> {
        self.put(name, &key.to_key_bytes())
    }

    /// Read a typed key stored under `name`.
    pub fn get_key<K: KeyMaterial>(&self, name: &str) -> Result<K> {
        K::from_key_bytes(&self.get(name)?)
    }
}
