//! Passphrase-based payload encryption using AES-256-GCM.
//!
//! The blob layout is fixed so that any implementation can read data
//! written by another:
//!
//! ```text
//! [salt (32 bytes)][nonce (12 bytes)][ciphertext (variable)][tag (16 bytes)]
//! ```
//!
//! A fresh salt and nonce are drawn for every call, the key is derived with
//! Argon2id from (passphrase, salt), and any decryption failure is reported
//! as the single [`KeystoreError::DecryptionFailed`].

use crate::crypto::password::{derive_key, generate_salt, KdfParams, SALT_LENGTH};
use crate::error::{KeystoreError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// The length of the nonce used for AES-GCM encryption.
pub const NONCE_LENGTH: usize = 12;

/// The length of the AES-GCM authentication tag.
pub const TAG_LENGTH: usize = 16;

/// Bytes a blob carries beyond its plaintext.
pub const BLOB_OVERHEAD: usize = SALT_LENGTH + NONCE_LENGTH + TAG_LENGTH;

/// Encrypts and decrypts byte payloads under a single passphrase.
///
/// The manager holds nothing but the passphrase and KDF parameters, so one
/// instance can be shared across threads.
///
/// # Example
///
/// ```
/// use keyvault::crypto::encryption::EncryptionManager;
/// use keyvault::crypto::password::KdfParams;
///
/// let manager = EncryptionManager::with_params("secure-passphrase", KdfParams::new(64, 1, 1));
///
/// let blob = manager.encrypt(b"this is a secret key").unwrap();
/// let plaintext = manager.decrypt(&blob).unwrap();
///
/// assert_eq!(plaintext.as_slice(), b"this is a secret key");
/// ```
pub struct EncryptionManager {
    passphrase: Zeroizing<Vec<u8>>,
    params: KdfParams,
}

impl std::fmt::Debug for EncryptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionManager")
            .field("passphrase", &"[REDACTED]")
            .field("params", &self.params)
            .finish()
    }
}

impl EncryptionManager {
    /// Create a manager with the default Argon2id parameters.
    pub fn new(passphrase: impl AsRef<[u8]>) -> Self {
        Self::with_params(passphrase, KdfParams::default())
    }

    /// Create a manager with explicit Argon2id parameters.
    pub fn with_params(passphrase: impl AsRef<[u8]>, params: KdfParams) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.as_ref().to_vec()),
            params,
        }
    }

    /// The KDF parameters this manager derives keys with.
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Encrypt a payload.
    ///
    /// Fails only if the randomness source fails or the KDF parameters are
    /// invalid.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let salt = generate_salt()?;
        let derived_key = derive_key(&self.passphrase, &salt, &self.params)?;

        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| KeystoreError::Encryption(format!("Randomness source failed: {}", e)))?;

        let cipher = Aes256Gcm::new_from_slice(derived_key.as_slice())
            .map_err(|e| KeystoreError::Encryption(format!("Invalid key length: {}", e)))?;
        let ciphertext = cipher
            .encrypt(&nonce_bytes.into(), plaintext)
            .map_err(|e| KeystoreError::Encryption(format!("Encryption failed: {}", e)))?;

        let mut output = Vec::with_capacity(SALT_LENGTH + NONCE_LENGTH + ciphertext.len());
        output.extend_from_slice(&salt);
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);

        Ok(output)
    }

    /// Decrypt a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// Short input, a wrong passphrase and a modified blob are not
    /// distinguished: all return [`KeystoreError::DecryptionFailed`].
    pub fn decrypt(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if blob.len() < BLOB_OVERHEAD {
            return Err(KeystoreError::DecryptionFailed);
        }

        let (salt, rest) = blob.split_at(SALT_LENGTH);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LENGTH);

        let derived_key = derive_key(&self.passphrase, salt, &self.params)
            .map_err(|_| KeystoreError::DecryptionFailed)?;

        let cipher = Aes256Gcm::new_from_slice(derived_key.as_slice())
            .map_err(|_| KeystoreError::DecryptionFailed)?;

        let plaintext = cipher
            .decrypt(nonce_bytes.into(), ciphertext)
            .map_err(|_| KeystoreError::DecryptionFailed)?;

        Ok(Zeroizing::new(plaintext))
    }
}
