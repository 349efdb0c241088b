#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Transfer progress reporting for depot
//!
//! [`TransferMeter`] sits between a download stream and its destination,
//! counting bytes as they are written and printing a throttled, human-readable
//! progress line. Reporting is best-effort: a failing progress output is
//! logged and ignored, while errors from the destination are returned as-is.

mod format;
mod meter;

pub use format::{format_bytes, format_duration, format_speed};
pub use meter::{render_progress, TransferMeter, TransferState, REPORT_INTERVAL};
