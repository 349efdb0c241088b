use serde::{Deserialize, Serialize};

/// Archive extraction events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArchiveEvent {
    /// Extraction of an archive started
    Started { destination: String },

    /// One entry written to disk
    EntryExtracted { path: String },

    /// Entry type that is not unpacked (devices, FIFOs, ...)
    EntrySkipped { path: String, kind: String },

    /// Extraction finished
    Completed {
        destination: String,
        files: usize,
        directories: usize,
        symlinks: usize,
        skipped: usize,
    },
}
