//! Artifact transfer error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferError {
    #[error("failed to send download request to {url}: {message}")]
    Request { url: String, message: String },

    #[error("download from {url} failed with HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("server ignored resume request at offset {offset} (HTTP {status})")]
    ResumeRejected { offset: u64, status: u16 },

    #[error("download stream from {url} interrupted after {bytes} bytes: {message}")]
    Stream {
        url: String,
        bytes: u64,
        message: String,
    },

    #[error("failed to write downloaded data: {message}")]
    Io { message: String },
}

impl UserFacingError for TransferError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Request { .. } | Self::Stream { .. } => {
                Some("Retry the download; partial files can be resumed.")
            }
            Self::ResumeRejected { .. } => Some("Remove the partial file and download again."),
            Self::Io { .. } => Some("Check free disk space and permissions of the destination."),
            Self::Status { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Stream { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::ResumeRejected { .. } | Self::Io { .. } => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Request { .. } => "transfer.request",
            Self::Status { .. } => "transfer.status",
            Self::ResumeRejected { .. } => "transfer.resume_rejected",
            Self::Stream { .. } => "transfer.stream",
            Self::Io { .. } => "transfer.io",
        })
    }
}
