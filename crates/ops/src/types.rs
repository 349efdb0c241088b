//! Request and report types for operations

use depot_archive::ExtractReport;
use depot_config::DownloadConfig;
use depot_hash::Md5Digest;
use depot_types::Build;
use std::path::PathBuf;

/// What to fetch and how
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub product: String,
    /// Exact version, or empty / `"latest"` for the newest build
    pub version: String,
    /// Optional build hash prefix
    pub hash: String,
    /// Continue a partial file left by an earlier run
    pub resume: bool,
    pub verify: bool,
    /// Unpack tar / tar.gz artifacts next to the download
    pub extract: bool,
    /// Suppress progress output
    pub quiet: bool,
}

impl FetchRequest {
    /// Request the latest build of `product` with default behaviour
    #[must_use]
    pub fn new(product: impl Into<String>) -> Self {
        Self::from_config(product, &DownloadConfig::default())
    }

    /// Request the latest build of `product` using the configured behaviour
    #[must_use]
    pub fn from_config(product: impl Into<String>, config: &DownloadConfig) -> Self {
        Self {
            product: product.into(),
            version: String::new(),
            hash: String::new(),
            resume: config.resume,
            verify: config.verify,
            extract: config.extract,
            quiet: config.quiet,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = hash.into();
        self
    }

    #[must_use]
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    #[must_use]
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn extract(mut self, extract: bool) -> Self {
        self.extract = extract;
        self
    }

    #[must_use]
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// Checksum state of a fetched artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumStatus {
    /// Verification was not requested
    Unchecked,
    /// The catalog published no checksum
    NotPublished,
    /// The file matched the published digest
    Verified(Md5Digest),
}

impl ChecksumStatus {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }
}

/// Fetch operation report
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// The build that was resolved
    pub build: Build,
    /// Where the artifact was written
    pub artifact_path: PathBuf,
    /// Bytes transferred by this run
    pub bytes_downloaded: u64,
    /// Bytes that were already on disk before this run
    pub resumed_from: u64,
    pub checksum: ChecksumStatus,
    /// Directory the archive was unpacked into
    pub extracted_to: Option<PathBuf>,
    pub extract: Option<ExtractReport>,
    /// Execution time
    pub duration_ms: u64,
}

impl FetchReport {
    /// Size of the artifact on disk after the run
    #[must_use]
    pub fn artifact_size(&self) -> u64 {
        self.resumed_from + self.bytes_downloaded
    }

    #[must_use]
    pub fn resumed(&self) -> bool {
        self.resumed_from > 0
    }
}
