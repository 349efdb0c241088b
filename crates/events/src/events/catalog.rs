use serde::{Deserialize, Serialize};

/// Build catalog lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// Catalog fetched and sorted
    Fetched { product: String, builds: usize },

    /// Selector resolved to a single build
    Resolved {
        product: String,
        version: String,
        hash: String,
    },
}
