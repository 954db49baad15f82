//! Local filesystem backend.
//!
//! Objects are plain files, created/truncated with owner-only (`0600`)
//! permissions: the blob holds ciphertext, but the adjacent signature
//! grants restore-authenticity to whoever can read the pair.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use kvault_core::KvaultResult;

/// Path of the signature companion: `<path>.sig`.
pub fn sig_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sig");
    PathBuf::from(name)
}

/// Create/truncate a file with mode `0600` and write the object.
pub async fn write_object(path: &Path, data: &[u8]) -> KvaultResult<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    debug!(path = %path.display(), bytes = data.len(), "wrote local object");
    Ok(())
}

/// Read an entire object from a file.
pub async fn read_object(path: &Path) -> KvaultResult<Vec<u8>> {
    let data = tokio::fs::read(path).await?;
    debug!(path = %path.display(), bytes = data.len(), "read local object");
    Ok(data)
}
