//! Error types for the keyvault library.
//!
//! Every failure a keystore operation can produce is a variant of
//! [`KeystoreError`], so callers can branch on the kind of failure instead
//! of matching on message text.

use thiserror::Error;

/// Reasons a proposed key name is rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    /// The name is the empty string.
    #[error("empty name")]
    Empty,

    /// The name contains the `/` path separator.
    #[error("contains separator")]
    ContainsSeparator,

    /// The name starts with `.`.
    #[error("begins with period")]
    BeginsWithPeriod,
}

/// The main error type for keystore operations.
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// Name failed validation; storage was not touched
    #[error("Invalid key name: {0}")]
    InvalidName(#[from] NameError),

    /// A record already exists under this name
    #[error("Key already exists: {0}")]
    KeyAlreadyExists(String),

    /// No record exists under this name
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Wrong passphrase or tampered ciphertext. Carries no detail.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Underlying storage engine failure
    #[error("Store error: {0}")]
    Store(String),

    /// Operation attempted after the keystore was closed
    #[error("Keystore is closed")]
    StoreClosed,

    /// The storage path could not be attached
    #[error("Failed to open keystore: {0}")]
    Open(String),

    /// Write attempted on a keystore opened read-only
    #[error("Keystore is read-only")]
    ReadOnly,

    /// Key derivation parameters were rejected
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Encryption could not be performed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Key bytes could not be turned into a concrete key type
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Configuration is missing or malformed
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for keystore operations.
pub type Result<T> = std::result::Result<T, KeystoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeystoreError::KeyNotFound("node-1".to_string());
        assert_eq!(err.to_string(), "Key not found: node-1");
    }

    #[test]
    fn test_name_error_reasons() {
        assert_eq!(NameError::Empty.to_string(), "empty name");
        assert_eq!(NameError::ContainsSeparator.to_string(), "contains separator");
        assert_eq!(NameError::BeginsWithPeriod.to_string(), "begins with period");
    }

    #[test]
    fn test_invalid_name_from_name_error() {
        let err: KeystoreError = NameError::Empty.into();
        assert!(matches!(err, KeystoreError::InvalidName(NameError::Empty)));
        assert_eq!(err.to_string(), "Invalid key name: empty name");
    }

    #[test]
    fn test_decryption_failed_is_uninformative() {
        assert_eq!(KeystoreError::DecryptionFailed.to_string(), "Decryption failed");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeystoreError>();
    }
}
