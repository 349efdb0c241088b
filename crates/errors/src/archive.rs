//! Archive extraction error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchiveError {
    #[error("archive entry {entry:?} escapes the destination directory")]
    PathTraversal { entry: String },

    #[error("link {entry:?} points outside the destination directory: {target:?}")]
    UnsafeLinkTarget { entry: String, target: String },

    #[error("entry {entry:?} not found in archive")]
    EntryNotFound { entry: String },

    #[error("malformed archive: {message}")]
    Malformed { message: String },

    #[error("failed to extract {path}: {message}")]
    Io { path: String, message: String },
}

impl UserFacingError for ArchiveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PathTraversal { .. } | Self::UnsafeLinkTarget { .. } => {
                Some("The archive is unsafe to unpack; obtain it from a trusted source.")
            }
            Self::Malformed { .. } => Some("The archive may be truncated; download it again."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::PathTraversal { .. } => "archive.path_traversal",
            Self::UnsafeLinkTarget { .. } => "archive.unsafe_link",
            Self::EntryNotFound { .. } => "archive.entry_not_found",
            Self::Malformed { .. } => "archive.malformed",
            Self::Io { .. } => "archive.io",
        })
    }
}
