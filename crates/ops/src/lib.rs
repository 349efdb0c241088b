#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for depot
//!
//! This crate is the orchestration layer between a front end and the
//! specialized crates: it resolves a build through `depot-net`, writes the
//! artifact to disk, checks it with `depot-hash` and unpacks it with
//! `depot-archive`.

mod fetch;
mod types;

pub use fetch::{extraction_dir, fetch_build};
pub use types::{ChecksumStatus, FetchReport, FetchRequest};
