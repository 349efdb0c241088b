//! Integrity verification error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerifyError {
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    #[error("failed to read data for verification: {message}")]
    Io { message: String },

    #[error("build {version} ({hash}) has no artifacts to verify")]
    MissingArtifact { version: String, hash: String },
}

impl UserFacingError for VerifyError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ChecksumMismatch { .. } => {
                Some("Delete the downloaded file and download it again from the start.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ChecksumMismatch { .. } => "verify.checksum_mismatch",
            Self::Io { .. } => "verify.io",
            Self::MissingArtifact { .. } => "verify.missing_artifact",
        })
    }
}
