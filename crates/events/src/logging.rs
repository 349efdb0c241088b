//! Structured logging integration for events

use crate::{AppEvent, ArchiveEvent, CatalogEvent, DownloadEvent, GeneralEvent};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` through `tracing` with structured fields
pub fn log_event(event: &AppEvent) {
    let target = event.log_target();
    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message } => {
                warn!(target: "depot::events::general", "{message}");
            }
            GeneralEvent::Error { message } => {
                error!(target: "depot::events::general", "{message}");
            }
            GeneralEvent::DebugLog { message } => {
                debug!(target: "depot::events::general", "{message}");
            }
        },

        AppEvent::Catalog(catalog) => match catalog {
            CatalogEvent::Fetched { product, builds } => {
                info!(
                    event_target = target,
                    product = %product,
                    builds = builds,
                    "Build catalog fetched"
                );
            }
            CatalogEvent::Resolved {
                product,
                version,
                hash,
            } => {
                info!(
                    event_target = target,
                    product = %product,
                    version = %version,
                    hash = %hash,
                    "Build resolved"
                );
            }
        },

        AppEvent::Download(download) => match download {
            DownloadEvent::Started {
                url,
                total_size,
                resume_offset,
            } => {
                info!(
                    event_target = target,
                    url = %url,
                    total_size = ?total_size,
                    resume_offset = resume_offset,
                    "Download started"
                );
            }
            DownloadEvent::Completed { url, bytes } => {
                info!(event_target = target, url = %url, bytes = bytes, "Download completed");
            }
            DownloadEvent::Failed { url, failure } => {
                error!(
                    event_target = target,
                    url = %url,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Download failed"
                );
            }
            DownloadEvent::VerificationCompleted {
                filename,
                digest,
                skipped,
            } => {
                info!(
                    event_target = target,
                    filename = %filename,
                    digest = %digest,
                    skipped = skipped,
                    "Checksum verification completed"
                );
            }
        },

        AppEvent::Archive(archive) => match archive {
            ArchiveEvent::Started { destination } => {
                info!(event_target = target, destination = %destination, "Extraction started");
            }
            ArchiveEvent::EntryExtracted { path } => {
                debug!(event_target = target, path = %path, "Entry extracted");
            }
            ArchiveEvent::EntrySkipped { path, kind } => {
                warn!(event_target = target, path = %path, kind = %kind, "Entry skipped");
            }
            ArchiveEvent::Completed {
                destination,
                files,
                directories,
                symlinks,
                skipped,
            } => {
                info!(
                    event_target = target,
                    destination = %destination,
                    files = files,
                    directories = directories,
                    symlinks = symlinks,
                    skipped = skipped,
                    "Extraction completed"
                );
            }
        },
    }
}
