//! SHA-256 content digests for integrity reporting.
//!
//! Digests are informational: they are reported next to stored files and
//! embedded in redaction markers, but never used to address storage.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use std::io::Read;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read size used when hashing from a reader
pub const CHUNK_SIZE: usize = 4096;

/// A SHA-256 digest (256 bits / 32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// The number of bytes in a digest
    pub const LEN: usize = 32;

    /// Compute the SHA-256 digest of data
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let mut writer = DigestWriter::new();
        writer.update(data);
        writer.finalize()
    }

    /// Hash everything a reader yields, `CHUNK_SIZE` bytes at a time
    ///
    /// # Errors
    ///
    /// Returns the first I/O error raised by the reader
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut writer = DigestWriter::new();
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            writer.update(&buf[..n]);
        }
        Ok(writer.finalize())
    }

    /// Async counterpart of [`Digest::from_reader`]
    ///
    /// # Errors
    ///
    /// Returns the first I/O error raised by the reader
    pub async fn from_async_reader<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Self> {
        let mut writer = DigestWriter::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.update(&buf[..n]);
        }
        Ok(writer.finalize())
    }

    /// Create from bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get as bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex string (64 chars)
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    ///
    /// # Errors
    ///
    /// Returns error if hex is invalid or not 32 bytes
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        let bytes = hex::decode(hex).map_err(|_| HashError::InvalidHex)?;
        if bytes.len() != Self::LEN {
            return Err(HashError::InvalidLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental SHA-256 hasher
///
/// Lets a backend hash bytes as they pass through without buffering the
/// whole file.
#[derive(Debug, Clone, Default)]
pub struct DigestWriter {
    hasher: Sha256,
    bytes: u64,
}

impl DigestWriter {
    /// Create a new hasher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes
    pub fn update(&mut self, data: &[u8]) {
        sha2::Digest::update(&mut self.hasher, data);
        self.bytes += data.len() as u64;
    }

    /// Number of bytes hashed so far
    #[must_use]
    pub const fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    /// Finish and return the digest
    #[must_use]
    pub fn finalize(self) -> Digest {
        Digest(sha2::Digest::finalize(self.hasher).into())
    }
}

impl std::io::Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Digest parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Invalid hex encoding
    InvalidHex,
    /// Invalid length (not 32 bytes)
    InvalidLength(usize),
}

impl std::error::Error for HashError {}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHex => write!(f, "Invalid hex encoding"),
            Self::InvalidLength(len) => write!(f, "Invalid digest length: {} (expected 32)", len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_digest_known_vector() {
        // sha256("abc")
        assert_eq!(
            Digest::compute(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_empty() {
        assert_eq!(
            Digest::compute(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_from_to_hex() {
        let digest = Digest::compute(b"test");
        let hex = digest.to_hex();
        assert_eq!(hex.len(), 64);
        let restored = Digest::from_hex(&hex).unwrap();
        assert_eq!(digest, restored);
    }

    #[test]
    fn test_digest_from_hex_rejects_bad_input() {
        assert_eq!(Digest::from_hex("zz"), Err(HashError::InvalidHex));
        assert_eq!(Digest::from_hex("abcd"), Err(HashError::InvalidLength(2)));
    }

    #[test]
    fn test_reader_matches_compute_across_chunks() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        let from_reader = Digest::from_reader(data.as_slice()).unwrap();
        assert_eq!(from_reader, Digest::compute(&data));
    }

    #[tokio::test]
    async fn test_async_reader_matches_compute() {
        let data = b"2024-01-01 INFO started\n2024-01-01 INFO stopped\n".repeat(200);
        let digest = Digest::from_async_reader(data.as_slice()).await.unwrap();
        assert_eq!(digest, Digest::compute(&data));
    }

    #[test]
    fn test_writer_counts_bytes() {
        let mut writer = DigestWriter::new();
        writer.update(b"hello ");
        writer.update(b"world");
        assert_eq!(writer.bytes_hashed(), 11);
        assert_eq!(writer.finalize(), Digest::compute(b"hello world"));
    }

    #[test]
    fn test_digest_serializes_as_hex() {
        let digest = Digest::compute(b"abc");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    proptest! {
        #[test]
        fn prop_digest_deterministic(data: Vec<u8>) {
            prop_assert_eq!(Digest::compute(&data), Digest::compute(&data));
        }

        #[test]
        fn prop_single_byte_change_changes_digest(mut data in proptest::collection::vec(any::<u8>(), 1..512), idx: usize) {
            let original = Digest::compute(&data);
            let i = idx % data.len();
            data[i] = data[i].wrapping_add(1);
            prop_assert_ne!(original, Digest::compute(&data));
        }
    }
}
