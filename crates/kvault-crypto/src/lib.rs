//! kvault-crypto: the secure backup-blob codec and authenticator
//!
//! Pipeline: plaintext → gzip compress → AES-256-OFB encrypt → blob,
//! with a detached HMAC-SHA256 signature computed over the *plaintext*
//! (pre-compression, pre-encryption) and stored as base64 text beside
//! the blob.
//!
//! The OFB cipher provides no tamper detection of its own; the detached
//! signature is the only integrity/authenticity guarantee in the system.
//!
//! Key material: a single 256-bit key, `SHA-256(passphrase)`, recomputed
//! per operation and never persisted. See [`codec::SealMode`] for the
//! legacy zero-IV compatibility mode and its documented weakness.

pub mod codec;
pub mod key;
pub mod signature;

pub use codec::{decode, encode, SealMode};
pub use key::DerivedKey;
pub use signature::{sign, verify};

/// Size of the derived key in bytes (256-bit).
pub const KEY_SIZE: usize = 32;

/// Size of the AES-OFB initialization vector (one AES block).
pub const IV_SIZE: usize = 16;
