//! Post-download integrity checks

use depot_errors::{Error, VerifyError};
use depot_hash::Md5Digest;
use depot_types::{Artifact, Build};
use tokio::io::AsyncRead;

/// Result of a successful verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumOutcome {
    /// The data hashed to the published digest
    Verified(Md5Digest),
    /// The catalog entry carries no checksum; accepted as-is
    NotPublished,
}

impl ChecksumOutcome {
    #[must_use]
    pub fn digest(&self) -> Option<Md5Digest> {
        match self {
            Self::Verified(digest) => Some(*digest),
            Self::NotPublished => None,
        }
    }
}

/// Verify `reader` against the primary artifact of `build`
///
/// # Errors
///
/// Returns `VerifyError::MissingArtifact` if the build lists no artifacts,
/// plus the errors of [`verify_checksum`].
pub async fn verify_artifact_checksum<R>(reader: R, build: &Build) -> Result<ChecksumOutcome, Error>
where
    R: AsyncRead + Unpin,
{
    let artifact = build
        .primary_artifact()
        .ok_or_else(|| VerifyError::MissingArtifact {
            version: build.version.clone(),
            hash: build.hash.clone(),
        })?;
    verify_checksum(reader, artifact).await
}

/// Hash everything `reader` yields and compare it with `artifact.md5sum`
///
/// An empty checksum is an explicit pass and leaves `reader` untouched.
///
/// # Errors
///
/// Returns `VerifyError::ChecksumMismatch` with both digests when they differ
/// and `VerifyError::Io` if reading fails.
pub async fn verify_checksum<R>(reader: R, artifact: &Artifact) -> Result<ChecksumOutcome, Error>
where
    R: AsyncRead + Unpin,
{
    if !artifact.has_checksum() {
        tracing::debug!(filename = %artifact.filename, "no checksum published, skipping verification");
        return Ok(ChecksumOutcome::NotPublished);
    }

    let (digest, bytes) = Md5Digest::hash_reader(reader).await?;
    if digest.matches_hex(&artifact.md5sum) {
        tracing::debug!(filename = %artifact.filename, bytes, digest = %digest, "checksum verified");
        Ok(ChecksumOutcome::Verified(digest))
    } else {
        Err(VerifyError::ChecksumMismatch {
            filename: artifact.filename.clone(),
            expected: artifact.md5sum.trim().to_ascii_lowercase(),
            actual: digest.to_hex(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_build;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

    fn build_with_checksum(md5sum: &str) -> Build {
        let mut build = sample_build();
        build.artifacts[0].md5sum = md5sum.to_string();
        build
    }

    #[tokio::test]
    async fn test_matching_checksum() {
        let build = build_with_checksum(HELLO_MD5);
        let outcome = verify_artifact_checksum(&b"hello world"[..], &build)
            .await
            .unwrap();
        assert_eq!(outcome.digest().unwrap().to_hex(), HELLO_MD5);
    }

    #[tokio::test]
    async fn test_checksum_comparison_ignores_case() {
        let build = build_with_checksum(&format!(" {} ", HELLO_MD5.to_uppercase()));
        assert!(verify_artifact_checksum(&b"hello world"[..], &build)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_flipped_byte_is_mismatch() {
        let build = build_with_checksum(HELLO_MD5);
        let err = verify_artifact_checksum(&b"hello worle"[..], &build)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains(HELLO_MD5), "{message}");
        let actual = Md5Digest::from_data(b"hello worle").to_hex();
        assert!(message.contains(&actual), "{message}");
        assert!(matches!(
            err,
            Error::Verify(VerifyError::ChecksumMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_checksum_passes() {
        let build = build_with_checksum("");
        let outcome = verify_artifact_checksum(&b"anything"[..], &build)
            .await
            .unwrap();
        assert_eq!(outcome, ChecksumOutcome::NotPublished);
    }

    #[tokio::test]
    async fn test_build_without_artifacts() {
        let mut build = sample_build();
        build.artifacts.clear();
        let err = verify_artifact_checksum(&b""[..], &build).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Verify(VerifyError::MissingArtifact { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_failure_is_verify_io() {
        struct Broken;

        impl AsyncRead for Broken {
            fn poll_read(
                self: Pin<&mut Self>,
                _: &mut Context<'_>,
                _: &mut ReadBuf<'_>,
            ) -> Poll<io::Result<()>> {
                Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
            }
        }

        let build = build_with_checksum(HELLO_MD5);
        let err = verify_artifact_checksum(Broken, &build).await.unwrap_err();
        assert!(matches!(err, Error::Verify(VerifyError::Io { .. })), "{err:?}");
    }

    #[tokio::test]
    async fn test_verify_specific_artifact() {
        let mut build = sample_build();
        build.artifacts.push(Artifact {
            md5sum: HELLO_MD5.to_string(),
            filename: "docs.tar".to_string(),
            name: "Docs".to_string(),
        });
        let docs = build.artifact("docs.tar").unwrap();
        assert!(verify_checksum(&b"hello world"[..], docs).await.is_ok());
    }
}
