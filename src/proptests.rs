//! Property-based tests for encryption and name validation.

use proptest::prelude::*;

use crate::crypto::encryption::{EncryptionManager, BLOB_OVERHEAD};
use crate::crypto::password::KdfParams;
use crate::error::{KeystoreError, NameError};
use crate::storage::keystore::Keystore;
use crate::storage::memory::MemoryStore;
use crate::storage::name::validate_name;

fn manager(passphrase: &[u8]) -> EncryptionManager {
    EncryptionManager::with_params(passphrase, KdfParams::new(64, 1, 1))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Decrypting an encrypted payload returns the original bytes.
    #[test]
    fn encrypt_decrypt_roundtrip(
        passphrase in prop::collection::vec(any::<u8>(), 0..32),
        plaintext in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let manager = manager(&passphrase);
        let blob = manager.encrypt(&plaintext).unwrap();

        prop_assert_eq!(blob.len(), plaintext.len() + BLOB_OVERHEAD);
        let decrypted = manager.decrypt(&blob).unwrap();
        prop_assert_eq!(decrypted.as_slice(), plaintext.as_slice());
    }

    /// Two encryptions of the same payload never match byte for byte.
    #[test]
    fn encryption_is_randomized(plaintext in prop::collection::vec(any::<u8>(), 0..128)) {
        let manager = manager(b"passphrase");

        let blob1 = manager.encrypt(&plaintext).unwrap();
        let blob2 = manager.encrypt(&plaintext).unwrap();

        prop_assert_ne!(blob1, blob2);
    }

    /// Flipping any bit of a blob makes decryption fail.
    #[test]
    fn single_bit_flip_detected(
        plaintext in prop::collection::vec(any::<u8>(), 0..64),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let manager = manager(b"passphrase");
        let mut blob = manager.encrypt(&plaintext).unwrap();

        let i = index.index(blob.len());
        blob[i] ^= 1 << bit;

        prop_assert!(matches!(manager.decrypt(&blob), Err(KeystoreError::DecryptionFailed)));
    }

    /// A different passphrase never opens the blob.
    #[test]
    fn wrong_passphrase_fails(
        p1 in "[a-z]{1,16}",
        p2 in "[a-z]{1,16}",
        plaintext in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        prop_assume!(p1 != p2);

        let blob = manager(p1.as_bytes()).encrypt(&plaintext).unwrap();
        prop_assert!(matches!(
            manager(p2.as_bytes()).decrypt(&blob),
            Err(KeystoreError::DecryptionFailed)
        ));
    }

    /// Arbitrary short input is rejected, never panics.
    #[test]
    fn short_input_rejected(data in prop::collection::vec(any::<u8>(), 0..BLOB_OVERHEAD)) {
        prop_assert!(matches!(manager(b"passphrase").decrypt(&data), Err(KeystoreError::DecryptionFailed)));
    }

    /// Validation agrees with the three rules for any string.
    #[test]
    fn validate_name_matches_rules(name in ".{0,16}") {
        let expected = if name.is_empty() {
            Err(NameError::Empty)
        } else if name.contains('/') {
            Err(NameError::ContainsSeparator)
        } else if name.starts_with('.') {
            Err(NameError::BeginsWithPeriod)
        } else {
            Ok(())
        };
        prop_assert_eq!(validate_name(&name), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// After storing distinct names, list returns exactly that set.
    #[test]
    fn list_matches_stored_names(
        names in prop::collection::btree_set("[a-z0-9][a-z0-9._-]{0,12}", 0..8),
    ) {
        let keystore = Keystore::with_store(MemoryStore::new(), manager(b"passphrase"), false);

        for name in &names {
            keystore.put(name, name.as_bytes()).unwrap();
        }

        let mut listed = keystore.list().unwrap();
        listed.sort();
        let expected: Vec<String> = names.iter().cloned().collect();
        prop_assert_eq!(listed, expected);

        for name in &names {
            let payload = keystore.get(name).unwrap();
            prop_assert_eq!(payload.as_slice(), name.as_bytes());
        }
    }
}
