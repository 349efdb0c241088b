use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Artifact transfer and verification events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Response headers received, body streaming begins
    Started {
        url: String,
        total_size: Option<u64>,
        resume_offset: u64,
    },

    /// Body fully written to the sink
    Completed { url: String, bytes: u64 },

    /// Transfer aborted
    Failed { url: String, failure: FailureContext },

    /// Checksum verification finished successfully
    VerificationCompleted {
        filename: String,
        digest: String,
        /// The catalog entry carried no checksum
        skipped: bool,
    },
}
