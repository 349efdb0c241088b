//! Sorted build catalog and selector resolution

use crate::Build;
use depot_errors::CatalogError;
use std::cmp::Ordering;

/// Version selector that always resolves to the newest build
pub const LATEST: &str = "latest";

/// Order builds by date, oldest first
///
/// Builds published at the same instant order internal before public, so a
/// public build wins when the newest entry is picked.
#[must_use]
pub fn compare_builds(a: &Build, b: &Build) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| b.internal.cmp(&a.internal))
}

/// All builds known for one product, sorted ascending by [`compare_builds`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildCatalog {
    builds: Vec<Build>,
}

impl BuildCatalog {
    /// Sort the given builds into a catalog
    #[must_use]
    pub fn new(mut builds: Vec<Build>) -> Self {
        builds.sort_by(compare_builds);
        Self { builds }
    }

    #[must_use]
    pub fn builds(&self) -> &[Build] {
        &self.builds
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Build> {
        self.builds.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.builds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    /// Newest build in the catalog
    #[must_use]
    pub fn latest(&self) -> Option<&Build> {
        self.builds.last()
    }

    /// Resolve a `(version, hash)` selector to exactly one build
    ///
    /// An empty version or `"latest"` picks the newest build. Otherwise the
    /// version must match exactly and, when `hash` is non-empty, the build hash
    /// must start with it. The newest surviving match wins.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NoBuilds` for an empty catalog and
    /// `CatalogError::BuildNotFound` when nothing matches the selector.
    pub fn select(&self, product: &str, version: &str, hash: &str) -> Result<&Build, CatalogError> {
        let Some(latest) = self.latest() else {
            return Err(CatalogError::NoBuilds {
                product: product.to_string(),
            });
        };

        if version.is_empty() || version == LATEST {
            return Ok(latest);
        }

        self.builds
            .iter()
            .filter(|build| build.version == version)
            .filter(|build| hash.is_empty() || build.matches_hash_prefix(hash))
            .next_back()
            .ok_or_else(|| CatalogError::BuildNotFound {
                product: product.to_string(),
                version: version.to_string(),
                hash: hash.to_string(),
            })
    }
}

impl From<Vec<Build>> for BuildCatalog {
    fn from(builds: Vec<Build>) -> Self {
        Self::new(builds)
    }
}

impl IntoIterator for BuildCatalog {
    type Item = Build;
    type IntoIter = std::vec::IntoIter<Build>;

    fn into_iter(self) -> Self::IntoIter {
        self.builds.into_iter()
    }
}

impl<'a> IntoIterator for &'a BuildCatalog {
    type Item = &'a Build;
    type IntoIter = std::slice::Iter<'a, Build>;

    fn into_iter(self) -> Self::IntoIter {
        self.builds.iter()
    }
}
