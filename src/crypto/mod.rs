//! Cryptographic operations module.
//!
//! - Argon2id passphrase key derivation ([`password`])
//! - AES-256-GCM payload encryption ([`encryption`])
//! - Ed25519 keypair marshalling for stored keys ([`ed25519`])
//!
//! # Example
//!
//! ```rust
//! use keyvault::crypto::encryption::EncryptionManager;
//! use keyvault::crypto::password::KdfParams;
//!
//! # fn example() -> keyvault::error::Result<()> {
//! let manager = EncryptionManager::with_params("secure-passphrase", KdfParams::new(64, 1, 1));
//!
//! let blob = manager.encrypt(b"raw private key")?;
//! let decrypted = manager.decrypt(&blob)?;
//! assert_eq!(decrypted.as_slice(), b"raw private key");
//! # Ok(())
//! # }
//! ```

pub mod ed25519;
pub mod encryption;
pub mod password;
