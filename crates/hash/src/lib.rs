#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! MD5 digests for artifact integrity checks
//!
//! The package service publishes an MD5 checksum per artifact. This crate
//! computes that digest over streams without buffering them in memory and
//! compares it with the published value.

use depot_errors::{Error, VerifyError};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// An MD5 digest value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Md5Digest {
    bytes: [u8; 16],
}

impl Md5Digest {
    /// Create a digest from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    /// Lowercase hex representation
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from a hex string (either case)
    ///
    /// # Errors
    /// Returns an error if the input is not 32 hexadecimal characters.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s.trim()).map_err(|e| VerifyError::Io {
            message: format!("invalid md5 hex: {e}"),
        })?;

        if bytes.len() != 16 {
            return Err(VerifyError::Io {
                message: format!("md5 digest must be 16 bytes, got {}", bytes.len()),
            }
            .into());
        }

        let mut array = [0u8; 16];
        array.copy_from_slice(&bytes);
        Ok(Self::from_bytes(array))
    }

    /// Compute the digest of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Md5Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Compare against a published checksum, ignoring case and surrounding whitespace
    #[must_use]
    pub fn matches_hex(&self, expected: &str) -> bool {
        self.to_hex().eq_ignore_ascii_case(expected.trim())
    }

    /// Compute the digest of everything `reader` yields, consuming it
    ///
    /// # Errors
    /// Returns `VerifyError::Io` if reading fails.
    pub async fn hash_reader<R>(mut reader: R) -> Result<(Self, u64), Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut hasher = Md5Hasher::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = reader.read(&mut buffer).await.map_err(read_error)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        let total = hasher.bytes_hashed();
        Ok((hasher.finalize(), total))
    }

    /// Blocking counterpart of [`Md5Digest::hash_reader`]
    ///
    /// # Errors
    /// Returns `VerifyError::Io` if reading fails.
    pub fn hash_sync_reader<R: Read>(mut reader: R) -> Result<(Self, u64), Error> {
        let mut hasher = Md5Hasher::new();
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_error(e)),
            };
            hasher.update(&buffer[..n]);
        }

        let total = hasher.bytes_hashed();
        Ok((hasher.finalize(), total))
    }

    /// Compute the digest of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        let (digest, _) = Self::hash_reader(file).await?;
        Ok(digest)
    }
}

fn read_error(err: std::io::Error) -> Error {
    VerifyError::Io {
        message: err.to_string(),
    }
    .into()
}

/// Incremental MD5 computation
#[derive(Clone, Default)]
pub struct Md5Hasher {
    inner: Md5,
    bytes: u64,
}

impl Md5Hasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.bytes += data.len() as u64;
    }

    /// Number of bytes fed so far
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes
    }

    #[must_use]
    pub fn finalize(self) -> Md5Digest {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.inner.finalize());
        Md5Digest::from_bytes(bytes)
    }
}

impl fmt::Debug for Md5Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Md5Hasher")
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Md5Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Md5Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Md5Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            Md5Digest::from_data(b"").to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            Md5Digest::from_data(b"hello world").to_hex(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn test_matches_hex_ignores_case() {
        let digest = Md5Digest::from_data(b"hello world");
        assert!(digest.matches_hex("5EB63BBBE01EEED093CB22BB8F5ACDC3"));
        assert!(digest.matches_hex(" 5eb63bbbe01eeed093cb22bb8f5acdc3\n"));
        assert!(!digest.matches_hex("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn test_from_hex() {
        let digest = Md5Digest::from_hex("5EB63BBBE01EEED093CB22BB8F5ACDC3").unwrap();
        assert_eq!(digest, Md5Digest::from_data(b"hello world"));
        assert!(Md5Digest::from_hex("abc").is_err());
        assert!(Md5Digest::from_hex("zz").is_err());
    }

    #[test]
    fn test_serialization() {
        let digest = Md5Digest::from_data(b"test");
        let json = serde_json::to_string(&digest).unwrap();
        let deserialized: Md5Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(digest, deserialized);
    }

    #[tokio::test]
    async fn test_hash_reader_counts_bytes() {
        let data = vec![7u8; CHUNK_SIZE * 2 + 17];
        let (digest, bytes) = Md5Digest::hash_reader(&data[..]).await.unwrap();
        assert_eq!(bytes, data.len() as u64);
        assert_eq!(digest, Md5Digest::from_data(&data));

        let (sync_digest, sync_bytes) = Md5Digest::hash_sync_reader(&data[..]).unwrap();
        assert_eq!(sync_digest, digest);
        assert_eq!(sync_bytes, bytes);
    }

    #[tokio::test]
    async fn test_hash_file() {
        use std::io::Write;
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"test file content").unwrap();

        let digest = Md5Digest::hash_file(temp.path()).await.unwrap();
        assert_eq!(digest, Md5Digest::from_data(b"test file content"));
    }

    #[test]
    fn test_read_error_is_verification_io() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device unplugged"))
            }
        }
        let err = Md5Digest::hash_sync_reader(Failing).unwrap_err();
        assert!(matches!(err, Error::Verify(VerifyError::Io { .. })));
    }
}
