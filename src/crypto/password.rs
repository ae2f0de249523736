//! Passphrase-based key derivation.
//!
//! Keys are stretched from the passphrase with Argon2id. The salt is fresh
//! per encryption and travels with the ciphertext, so the derived key is
//! never stored anywhere.

use crate::error::{KeystoreError, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// The length of the salt used for key derivation.
pub const SALT_LENGTH: usize = 32;

/// The length of the derived key.
pub const KEY_LENGTH: usize = 32;

/// Argon2id cost parameters.
///
/// The parameters are not part of the ciphertext blob. The defaults are
/// what [`EncryptionManager::new`](crate::crypto::encryption::EncryptionManager::new)
/// uses; a keystore records its own parameters alongside its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    /// Create parameters with explicit costs.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LENGTH),
        )
        .map_err(|e| KeystoreError::KeyDerivation(format!("Argon2 params error: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Generate a random salt for key derivation.
///
/// Fails only if the operating system's randomness source fails.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH]> {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| KeystoreError::Encryption(format!("Randomness source failed: {}", e)))?;
    Ok(salt)
}

/// Derive an encryption key from a passphrase and salt using Argon2id.
///
/// # Example
///
/// ```
/// use keyvault::crypto::password::{derive_key, generate_salt, KdfParams, KEY_LENGTH};
///
/// let salt = generate_salt().unwrap();
/// let key = derive_key(b"secure-passphrase", &salt, &KdfParams::new(64, 1, 1)).unwrap();
/// assert_eq!(key.len(), KEY_LENGTH);
/// ```
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(KeystoreError::KeyDerivation(format!(
            "Salt must be {} bytes, got {}",
            SALT_LENGTH,
            salt.len()
        )));
    }

    let mut output = Zeroizing::new([0u8; KEY_LENGTH]);
    params
        .argon2()?
        .hash_password_into(passphrase, salt, &mut output[..])
        .map_err(|e| KeystoreError::KeyDerivation(format!("Argon2 error: {}", e)))?;

    Ok(output)
}
