//! kvault-storage: dual-backend transport for backup artifacts
//!
//! A destination string is resolved into a [`StorageTarget`] (a local
//! filesystem path or an S3-compatible object locator) and the
//! transport moves one blob + signature pair against it. Every backup
//! is two adjacent objects: `<name>` (the encrypted blob) and
//! `<name>.sig` (base64 HMAC text over the plaintext).

pub mod local;
pub mod s3;
pub mod transport;
pub mod uri;

pub use transport::Transport;
pub use uri::{resolve, ObjectCredentials, ObjectTarget, StorageTarget};
