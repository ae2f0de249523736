//! Ed25519 keypairs as keystore payloads.
//!
//! The keystore only sees opaque bytes. [`KeyMaterial`] is the boundary
//! where a concrete key type is turned into those bytes and back.

use crate::error::{KeystoreError, Result};
use ed25519_dalek::{SigningKey, VerifyingKey};
use zeroize::Zeroizing;

/// Length of an Ed25519 secret seed.
pub const ED25519_SECRET_LENGTH: usize = 32;

/// A key type that can be stored in a keystore.
pub trait KeyMaterial: Sized {
    /// Serialize the secret part of the key.
    fn to_key_bytes(&self) -> Zeroizing<Vec<u8>>;

    /// Rebuild the key from bytes previously produced by `to_key_bytes`.
    fn from_key_bytes(bytes: &[u8]) -> Result<Self>;
}

/// An Ed25519 keypair consisting of a secret key and public key.
#[derive(Debug, Clone)]
pub struct Ed25519Keypair {
    pub secret: SigningKey,
    pub public: VerifyingKey,
}

impl Ed25519Keypair {
    /// Create a new keypair from a signing key.
    pub fn from_secret(secret: SigningKey) -> Self {
        let public = secret.verifying_key();
        Self { secret, public }
    }

    /// Get the public key as bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Hex-encoded public key, for display.
    pub fn public_hex(&self) -> String {
        hex::encode(self.public_bytes())
    }
}

impl KeyMaterial for Ed25519Keypair {
    fn to_key_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.secret.to_bytes().to_vec())
    }

    fn from_key_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; ED25519_SECRET_LENGTH] = bytes.try_into().map_err(|_| {
            KeystoreError::InvalidKey(format!(
                "Expected {} bytes for Ed25519 secret key, got {}",
                ED25519_SECRET_LENGTH,
                bytes.len()
            ))
        })?;
        let seed = Zeroizing::new(seed);

        Ok(Self::from_secret(SigningKey::from_bytes(&seed)))
    }
}
