//! Key derivation: SHA-256 passphrase hash → 256-bit symmetric key.
//!
//! The legacy artifact format keys both the cipher and the HMAC with a
//! plain `SHA-256(passphrase)` digest, so that is what we derive here.
//! The key is recomputed per operation, held only for the duration of
//! that operation, and never written anywhere.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// A 256-bit key derived from the user passphrase.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Derive the key from a passphrase: `SHA-256(passphrase)`.
    pub fn from_passphrase(passphrase: &SecretString) -> Self {
        let digest = Sha256::digest(passphrase.expose_secret().as_bytes());
        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&digest);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_deterministic() {
        let k1 = DerivedKey::from_passphrase(&SecretString::from("correct-horse"));
        let k2 = DerivedKey::from_passphrase(&SecretString::from("correct-horse"));
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_passphrases_differ() {
        let k1 = DerivedKey::from_passphrase(&SecretString::from("correct-horse"));
        let k2 = DerivedKey::from_passphrase(&SecretString::from("wrong"));
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let key = DerivedKey::from_passphrase(&SecretString::from("hunter2"));
        let printed = format!("{key:?}");
        assert!(printed.contains("REDACTED"));
    }
}
