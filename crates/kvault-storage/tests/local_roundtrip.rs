//! End-to-end transport scenarios against the local backend.

use secrecy::SecretString;

use kvault_core::KvaultError;
use kvault_crypto::SealMode;
use kvault_storage::Transport;

fn passphrase(text: &str) -> SecretString {
    SecretString::from(text)
}

#[tokio::test]
async fn store_then_fetch_is_byte_exact() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cluster.bak");
    let dest = dest.to_str().unwrap();
    let document = br#"[{"key":"a/b/c","value":"dGVzdA=="}]"#;

    let transport = Transport::new(SealMode::LegacyZeroIv);
    transport
        .store(dest, &passphrase("correct-horse"), document)
        .await
        .unwrap();

    assert!(dir.path().join("cluster.bak").exists());
    assert!(dir.path().join("cluster.bak.sig").exists());

    let fetched = transport
        .fetch(dest, &passphrase("correct-horse"))
        .await
        .unwrap();
    assert_eq!(fetched, document);
}

#[tokio::test]
async fn fetch_with_wrong_passphrase_fails() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cluster.bak");
    let dest = dest.to_str().unwrap();

    let transport = Transport::default();
    transport
        .store(dest, &passphrase("correct-horse"), b"plaintext document")
        .await
        .unwrap();

    let err = transport.fetch(dest, &passphrase("wrong")).await.unwrap_err();
    // a wrong key almost always breaks the gzip header; on the off
    // chance it decompresses, the signature still fails
    let message = err.to_string();
    assert!(
        message.contains("corrupt archive") || matches!(err, KvaultError::BadSignature),
        "unexpected error: {message}"
    );
}

#[tokio::test]
async fn tampered_blob_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cluster.bak");
    let dest = dest.to_str().unwrap();

    let transport = Transport::default();
    transport
        .store(dest, &passphrase("correct-horse"), b"a document that must not change")
        .await
        .unwrap();

    let blob_path = dir.path().join("cluster.bak");
    let mut blob = std::fs::read(&blob_path).unwrap();
    let mid = blob.len() / 2;
    blob[mid] ^= 0x01;
    std::fs::write(&blob_path, blob).unwrap();

    assert!(transport.fetch(dest, &passphrase("correct-horse")).await.is_err());
}

#[tokio::test]
async fn stale_signature_is_rejected() {
    // simulates a crash between the two writes: the blob was replaced
    // but the signature still authenticates the old plaintext
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cluster.bak");
    let dest = dest.to_str().unwrap();

    let transport = Transport::default();
    transport
        .store(dest, &passphrase("correct-horse"), b"old contents")
        .await
        .unwrap();
    let stale_sig = std::fs::read(dir.path().join("cluster.bak.sig")).unwrap();

    transport
        .store(dest, &passphrase("correct-horse"), b"new contents")
        .await
        .unwrap();
    std::fs::write(dir.path().join("cluster.bak.sig"), stale_sig).unwrap();

    let err = transport
        .fetch(dest, &passphrase("correct-horse"))
        .await
        .unwrap_err();
    assert!(matches!(err, KvaultError::BadSignature));
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cluster.bak");
    let dest = dest.to_str().unwrap();

    let transport = Transport::default();
    transport
        .store(dest, &passphrase("correct-horse"), b"document")
        .await
        .unwrap();
    std::fs::remove_file(dir.path().join("cluster.bak.sig")).unwrap();

    assert!(transport.fetch(dest, &passphrase("correct-horse")).await.is_err());
}

#[tokio::test]
async fn random_iv_mode_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cluster.bak");
    let dest = dest.to_str().unwrap();

    let transport = Transport::new(SealMode::RandomIv);
    transport
        .store(dest, &passphrase("correct-horse"), b"document")
        .await
        .unwrap();
    let fetched = transport
        .fetch(dest, &passphrase("correct-horse"))
        .await
        .unwrap();
    assert_eq!(fetched, b"document");
}

#[tokio::test]
async fn store_overwrites_previous_backup() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cluster.bak");
    let dest = dest.to_str().unwrap();

    let transport = Transport::default();
    transport
        .store(dest, &passphrase("correct-horse"), b"first")
        .await
        .unwrap();
    transport
        .store(dest, &passphrase("correct-horse"), b"second")
        .await
        .unwrap();

    let fetched = transport
        .fetch(dest, &passphrase("correct-horse"))
        .await
        .unwrap();
    assert_eq!(fetched, b"second");
}

#[tokio::test]
async fn unknown_scheme_fails_before_any_io() {
    let transport = Transport::default();
    let err = transport
        .store("http://host/obj", &passphrase("k"), b"doc")
        .await
        .unwrap_err();
    assert!(matches!(err, KvaultError::UnknownScheme(_)));
}
