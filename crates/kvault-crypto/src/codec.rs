//! Blob codec: gzip compression composed with AES-256-OFB encryption.
//!
//! Encoding compresses first, then encrypts, so the blob leaks nothing
//! about plaintext structure beyond its compressed length. Decoding
//! reverses the order. Both directions run through streaming adapters
//! (a cipher `Write` under the gzip encoder, a cipher `Read` under the
//! gzip decoder) so arbitrarily large payloads flow incrementally.
//!
//! A wrong key garbles the gzip header, so decoding fails with a
//! corrupt-archive error before decompression completes. That error is
//! the principal passphrase-mismatch diagnostic; real tamper detection
//! lives in the detached signature, not here.

use std::io::{Read, Write};

use aes::Aes256;
use anyhow::Context;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ofb::cipher::{KeyIvInit, StreamCipher};
use ofb::Ofb;
use rand::RngCore;

use kvault_core::KvaultResult;

use crate::key::DerivedKey;
use crate::IV_SIZE;

type Aes256Ofb = Ofb<Aes256>;

/// Initialization-vector handling for the OFB stream.
///
/// The legacy artifact format uses a fixed all-zero IV. With a key that
/// is deterministic per passphrase, every blob sealed under one
/// passphrase shares an identical keystream prefix, a known
/// stream-cipher weakness, kept only for compatibility with existing
/// artifacts. New artifacts should prefer `RandomIv`, which prepends a
/// fresh 16-byte IV to the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SealMode {
    /// Bit-for-bit compatible with legacy artifacts: all-zero IV.
    #[default]
    LegacyZeroIv,
    /// Random IV, prepended to the blob. Not readable by legacy tools.
    RandomIv,
}

/// Compress and encrypt a plaintext document into a blob.
pub fn encode(plaintext: &[u8], key: &DerivedKey, mode: SealMode) -> KvaultResult<Vec<u8>> {
    let mut out = Vec::new();
    let iv = match mode {
        SealMode::LegacyZeroIv => [0u8; IV_SIZE],
        SealMode::RandomIv => {
            let mut iv = [0u8; IV_SIZE];
            rand::thread_rng().fill_bytes(&mut iv);
            out.extend_from_slice(&iv);
            iv
        }
    };

    let cipher = Aes256Ofb::new(key.as_bytes().into(), (&iv).into());
    let writer = CipherWriter::new(&mut out, cipher);
    let mut gz = GzEncoder::new(writer, Compression::default());
    gz.write_all(plaintext)?;
    gz.finish()?;
    Ok(out)
}

/// Decrypt and decompress a blob back into plaintext bytes.
pub fn decode(blob: &[u8], key: &DerivedKey, mode: SealMode) -> KvaultResult<Vec<u8>> {
    let (iv, body) = match mode {
        SealMode::LegacyZeroIv => ([0u8; IV_SIZE], blob),
        SealMode::RandomIv => {
            if blob.len() < IV_SIZE {
                return Err(anyhow::anyhow!(
                    "blob too short for a random-IV artifact: {} bytes",
                    blob.len()
                )
                .into());
            }
            let mut iv = [0u8; IV_SIZE];
            iv.copy_from_slice(&blob[..IV_SIZE]);
            (iv, &blob[IV_SIZE..])
        }
    };

    let cipher = Aes256Ofb::new(key.as_bytes().into(), (&iv).into());
    let mut gz = GzDecoder::new(CipherReader::new(body, cipher));
    let mut out = Vec::new();
    gz.read_to_end(&mut out)
        .context("corrupt archive: decode failed (wrong passphrase or damaged blob)")?;
    Ok(out)
}

/// `Write` adapter that OFB-encrypts everything passing through it.
struct CipherWriter<W: Write> {
    inner: W,
    cipher: Aes256Ofb,
    scratch: Vec<u8>,
}

impl<W: Write> CipherWriter<W> {
    fn new(inner: W, cipher: Aes256Ofb) -> Self {
        Self {
            inner,
            cipher,
            scratch: Vec::new(),
        }
    }
}

impl<W: Write> Write for CipherWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        self.cipher.apply_keystream(&mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// `Read` adapter that OFB-decrypts everything passing through it.
struct CipherReader<R: Read> {
    inner: R,
    cipher: Aes256Ofb,
}

impl<R: Read> CipherReader<R> {
    fn new(inner: R, cipher: Aes256Ofb) -> Self {
        Self { inner, cipher }
    }
}

impl<R: Read> Read for CipherReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.cipher.apply_keystream(&mut buf[..n]);
        Ok(n)
    }
}
