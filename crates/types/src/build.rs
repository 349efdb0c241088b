//! Build and artifact records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One published package build
///
/// `version` is not unique across a catalog and may contain path separators
/// (branch names such as `feature/login`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub version: String,
    pub date: DateTime<Utc>,
    pub hash: String,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub internal: bool,
}

/// One downloadable file belonging to a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Empty when the catalog entry predates checksums
    #[serde(default)]
    pub md5sum: String,
    pub filename: String,
    #[serde(default)]
    pub name: String,
}

impl Build {
    /// The artifact a download of this build transfers
    #[must_use]
    pub fn primary_artifact(&self) -> Option<&Artifact> {
        self.artifacts.first()
    }

    /// Look up an artifact by its filename
    #[must_use]
    pub fn artifact(&self, filename: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.filename == filename)
    }

    /// Whether this build's hash starts with the given (possibly abbreviated) hash
    #[must_use]
    pub fn matches_hash_prefix(&self, prefix: &str) -> bool {
        self.hash.starts_with(prefix)
    }
}

impl Artifact {
    /// Whether a checksum is available for verification
    #[must_use]
    pub fn has_checksum(&self) -> bool {
        !self.md5sum.trim().is_empty()
    }
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.hash.get(..12).unwrap_or(&self.hash);
        write!(f, "{} ({short}, {})", self.version, self.date.format("%Y-%m-%d"))?;
        if self.internal {
            write!(f, " [internal]")?;
        }
        Ok(())
    }
}
