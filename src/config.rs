//! Keystore configuration.
//!
//! [`KeystoreOpts`] is what [`Keystore::open`](crate::storage::keystore::Keystore::open)
//! takes. [`KeystoreConfig`] is the on-disk JSON form of everything except
//! the passphrase, which is never written to a config file.

use crate::crypto::password::KdfParams;
use crate::error::{KeystoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

/// Default keystore directory, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = "keystore";

/// Options for opening a keystore.
#[derive(Clone)]
pub struct KeystoreOpts {
    /// Passphrase protecting every stored record.
    pub passphrase: Zeroizing<String>,
    /// Directory holding the storage engine's files.
    pub storage_path: PathBuf,
    /// Attach to an existing store without allowing writes.
    pub read_only: bool,
    /// Argon2id cost parameters, recorded when a new store is created.
    pub kdf: KdfParams,
}

impl std::fmt::Debug for KeystoreOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreOpts")
            .field("passphrase", &"[REDACTED]")
            .field("storage_path", &self.storage_path)
            .field("read_only", &self.read_only)
            .field("kdf", &self.kdf)
            .finish()
    }
}

impl KeystoreOpts {
    /// Writable options with default KDF parameters.
    pub fn new(passphrase: impl Into<String>, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
            storage_path: storage_path.into(),
            read_only: false,
            kdf: KdfParams::default(),
        }
    }

    /// Set read-only mode.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Set the KDF parameters.
    pub fn kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }
}

/// Keystore settings loaded from a JSON file.
///
/// ```json
/// {
///   "storage_path": "/var/lib/keyvault",
///   "read_only": false,
///   "kdf": { "memory_kib": 19456, "iterations": 2, "parallelism": 1 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeystoreConfig {
    pub storage_path: PathBuf,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub kdf: KdfParams,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_DIR),
            read_only: false,
            kdf: KdfParams::default(),
        }
    }
}

impl KeystoreConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;

        debug!(config = %path.display(), storage_path = %config.storage_path.display(), "Loaded keystore config");
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(KeystoreError::Config("storage_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Combine with a passphrase into options for opening the keystore.
    pub fn into_opts(self, passphrase: impl Into<String>) -> KeystoreOpts {
        KeystoreOpts::new(passphrase, self.storage_path)
            .read_only(self.read_only)
            .kdf(self.kdf)
    }
}
