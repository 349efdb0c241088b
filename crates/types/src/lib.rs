#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for depot
//!
//! This crate provides the value objects materialized from catalog responses
//! (builds and their artifacts), the sorted catalog with its selector rules,
//! and the named request/response schema of each service endpoint.

pub mod build;
pub mod catalog;
pub mod wire;

// Re-export commonly used types
pub use build::{Artifact, Build};
pub use catalog::{compare_builds, BuildCatalog, LATEST};
pub use wire::{DownloadRequest, ListBuildsResponse};
pub use chrono::{DateTime, Utc};
