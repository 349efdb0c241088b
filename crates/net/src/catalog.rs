//! Build catalog requests

use crate::client::Transport;
use crate::error_body::summarize_error_body;
use crate::service::PackageService;
use depot_errors::{CatalogError, Error};
use depot_events::{AppEvent, CatalogEvent, EventEmitter};
use depot_types::{Build, BuildCatalog, ListBuildsResponse};
use reqwest::Method;

impl<T: Transport> PackageService<T> {
    /// Fetch every build of `product`, sorted oldest first
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Transport` if the request fails,
    /// `CatalogError::Status` for a non-success response (with the condensed
    /// body) and `CatalogError::Parse` if the body is not a build list.
    pub async fn list_builds(&self, product: &str) -> Result<BuildCatalog, Error> {
        let url = self.endpoint(product, false)?;
        self.emit_debug(format!("Fetching build catalog from {url}"));

        let transport_error = |e: reqwest::Error| CatalogError::Transport {
            product: product.to_string(),
            message: e.to_string(),
        };

        let request = self.request(Method::GET, url)?;
        let response = self.send(request).await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                product: product.to_string(),
                status: status.as_u16(),
                body: summarize_error_body(&body),
            }
            .into());
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let parsed: ListBuildsResponse =
            serde_json::from_slice(&body).map_err(|e| CatalogError::Parse {
                product: product.to_string(),
                message: e.to_string(),
            })?;

        let catalog = BuildCatalog::new(parsed.builds);
        tracing::debug!(product, builds = catalog.len(), "build catalog fetched");
        self.emit(AppEvent::Catalog(CatalogEvent::Fetched {
            product: product.to_string(),
            builds: catalog.len(),
        }));
        Ok(catalog)
    }

    /// Resolve a `(version, hash)` selector against the current catalog
    ///
    /// An empty version or `"latest"` selects the newest build; otherwise the
    /// newest build with exactly that version and, if given, a hash starting
    /// with `hash`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`PackageService::list_builds`], plus
    /// `CatalogError::NoBuilds` for an empty catalog and
    /// `CatalogError::BuildNotFound` when nothing matches.
    pub async fn get_build(&self, product: &str, version: &str, hash: &str) -> Result<Build, Error> {
        let catalog = self.list_builds(product).await?;
        let build = catalog.select(product, version, hash)?.clone();

        tracing::info!(product, version = %build.version, hash = %build.hash, "build resolved");
        self.emit(AppEvent::Catalog(CatalogEvent::Resolved {
            product: product.to_string(),
            version: build.version.clone(),
            hash: build.hash.clone(),
        }));
        Ok(build)
    }
}
