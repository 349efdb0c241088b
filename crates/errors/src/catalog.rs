//! Build catalog error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CatalogError {
    #[error("failed to fetch builds for {product}: {message}")]
    Transport { product: String, message: String },

    #[error("catalog request for {product} failed with HTTP {status}: {body}")]
    Status {
        product: String,
        status: u16,
        body: String,
    },

    #[error("failed to parse build catalog for {product}: {message}")]
    Parse { product: String, message: String },

    #[error("no builds available for {product}")]
    NoBuilds { product: String },

    #[error("no build found for {product} with version {version:?} and hash {hash:?}")]
    BuildNotFound {
        product: String,
        version: String,
        hash: String,
    },
}

impl UserFacingError for CatalogError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Transport { .. } => Some("Check your network connection and the service URL."),
            Self::Status { status: 401 | 403, .. } => Some("Check that your API key is valid."),
            Self::BuildNotFound { .. } => {
                Some("List the available builds and pick an existing version or hash prefix.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Transport { .. } => "catalog.transport",
            Self::Status { .. } => "catalog.status",
            Self::Parse { .. } => "catalog.parse",
            Self::NoBuilds { .. } => "catalog.no_builds",
            Self::BuildNotFound { .. } => "catalog.build_not_found",
        })
    }
}
