//! Detached signature: HMAC-SHA256 over the plaintext, as base64 text.
//!
//! The signature is always computed over the plaintext, never the
//! ciphertext, so it stays valid regardless of how the blob itself is
//! encoded, and a blob without a matching signature is untrusted.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use kvault_core::{KvaultError, KvaultResult};

use crate::key::DerivedKey;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(key: &DerivedKey) -> HmacSha256 {
    // HMAC-SHA256 accepts any key length, so this cannot fail for a
    // 32-byte key
    HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts 32-byte keys")
}

/// Compute the detached signature for a plaintext document.
pub fn sign(plaintext: &[u8], key: &DerivedKey) -> String {
    let mut mac = keyed_mac(key);
    mac.update(plaintext);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Verify a plaintext document against its detached signature text.
///
/// The comparison is constant-time. Any failure, undecodable base64
/// included, is `BadSignature`.
pub fn verify(plaintext: &[u8], key: &DerivedKey, signature_text: &str) -> KvaultResult<()> {
    let expected = STANDARD
        .decode(signature_text.trim().as_bytes())
        .map_err(|_| KvaultError::BadSignature)?;
    let mut mac = keyed_mac(key);
    mac.update(plaintext);
    mac.verify_slice(&expected).map_err(|_| KvaultError::BadSignature)
}
