//! keyvault: a passphrase-encrypted local keystore
//!
//! This library stores small secrets, such as node identity private keys,
//! in a local ordered key-value store. It provides:
//!
//! - An [`EncryptionManager`] that seals payloads with a key derived from a
//!   passphrase by Argon2id, using AES-256-GCM
//! - A [`Keystore`] that validates names, refuses to overwrite existing
//!   records, and encrypts every value before it reaches storage
//! - A storage engine interface with sled and in-memory implementations
//!
//! # Architecture
//!
//! Payloads are opaque bytes. Concrete key types cross into the keystore
//! through the [`KeyMaterial`](crypto::ed25519::KeyMaterial) trait. All
//! operations return `Result` with a [`KeystoreError`] variant for each kind
//! of failure.
//!
//! # Example
//!
//! ```rust,no_run
//! use keyvault::{Keystore, KeystoreOpts, Result};
//!
//! fn example() -> Result<()> {
//!     let keystore = Keystore::open(KeystoreOpts::new("s3cr3t", "./keystore"))?;
//!     keystore.put("node-1", b"raw private key")?;
//!     assert!(keystore.has("node-1")?);
//!     keystore.close()
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

#[cfg(test)]
mod proptests;

// Re-export commonly used types
pub use config::{KeystoreConfig, KeystoreOpts};
pub use crypto::encryption::EncryptionManager;
pub use error::{KeystoreError, NameError, Result};
pub use storage::keystore::Keystore;
