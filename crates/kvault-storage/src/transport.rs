//! Store/fetch orchestration over the codec, authenticator, and the two
//! storage backends.
//!
//! One `store` writes two objects in sequence: the blob at `<name>`,
//! then the signature text at `<name>.sig`. The pair is *not*
//! transactionally atomic: a crash between the writes leaves a blob
//! with a stale or missing signature. `fetch` requires both objects and
//! verifies the signature against the freshly decoded plaintext, so such
//! a pair is rejected instead of silently accepted.

use secrecy::SecretString;
use tracing::debug;

use kvault_core::KvaultResult;
use kvault_crypto::{decode, encode, sign, verify, DerivedKey, SealMode};

use crate::local;
use crate::s3::ObjectStore;
use crate::uri::{resolve, StorageTarget};

/// Suffix of the detached signature object.
const SIG_SUFFIX: &str = ".sig";

/// The dual-backend storage transport.
///
/// Holds no connection state: each operation resolves its own target
/// and derives its own key, so concurrent operations against different
/// targets never share anything mutable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transport {
    mode: SealMode,
}

impl Transport {
    pub fn new(mode: SealMode) -> Self {
        Self { mode }
    }

    /// Seal a plaintext document and write the blob + signature pair to
    /// a local path or object-store URI.
    pub async fn store(
        &self,
        dest: &str,
        passphrase: &SecretString,
        plaintext: &[u8],
    ) -> KvaultResult<()> {
        let target = resolve(dest)?;
        let key = DerivedKey::from_passphrase(passphrase);
        let signature = sign(plaintext, &key);
        let blob = encode(plaintext, &key, self.mode)?;
        debug!(dest, blob_bytes = blob.len(), "storing blob and signature");

        match target {
            StorageTarget::Local(path) => {
                local::write_object(&path, &blob).await?;
                local::write_object(&local::sig_path(&path), signature.as_bytes()).await?;
            }
            StorageTarget::Object(object) => {
                let store = ObjectStore::connect(&object).await?;
                store.ensure_bucket().await?;
                store.put_object(&object.key, blob).await?;
                store
                    .put_object(&format!("{}{SIG_SUFFIX}", object.key), signature.into_bytes())
                    .await?;
            }
        }
        Ok(())
    }

    /// Fetch and verify a blob + signature pair, returning the plaintext
    /// only when the signature checks out.
    pub async fn fetch(&self, src: &str, passphrase: &SecretString) -> KvaultResult<Vec<u8>> {
        let target = resolve(src)?;
        let key = DerivedKey::from_passphrase(passphrase);

        let (blob, signature) = match target {
            StorageTarget::Local(path) => {
                let blob = local::read_object(&path).await?;
                let signature = local::read_object(&local::sig_path(&path)).await?;
                (blob, signature)
            }
            StorageTarget::Object(object) => {
                let store = ObjectStore::connect(&object).await?;
                let blob = store.get_object(&object.key).await?;
                let signature = store
                    .get_object(&format!("{}{SIG_SUFFIX}", object.key))
                    .await?;
                (blob, signature)
            }
        };

        let plaintext = decode(&blob, &key, self.mode)?;
        verify(&plaintext, &key, &String::from_utf8_lossy(&signature))?;
        debug!(src, plaintext_bytes = plaintext.len(), "fetched and verified blob");
        Ok(plaintext)
    }
}
