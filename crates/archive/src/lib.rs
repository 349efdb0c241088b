#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Archive extraction for depot
//!
//! Reads tar archives, gzip-compressed or not, and either unpacks them below
//! a destination directory or hands out the bytes of a single entry without
//! touching disk. Every entry name is checked before anything is written;
//! names that would land outside the destination abort the run with
//! `ArchiveError::PathTraversal`. Link targets are resolved through the links
//! already extracted, and any that leave the destination fail with
//! `ArchiveError::UnsafeLinkTarget`. Entries written before a failing one
//! stay on disk.

mod entry;
mod extract;
mod path;
mod stream;

pub use entry::{stream_entry, EntryStream};
pub use extract::{extract_all, extract_one, ExtractReport, Extractor};
pub use stream::{open_tar_stream, TarStream};
