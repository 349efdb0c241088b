//! Fetch a build artifact: resolve, download, verify, unpack

use crate::types::{ChecksumStatus, FetchReport, FetchRequest};
use depot_archive::Extractor;
use depot_errors::{ArchiveError, Error, VerifyError};
use depot_events::{AppEvent, DownloadEvent, EventEmitter};
use depot_net::{verify_artifact_checksum, ChecksumOutcome, DownloadOptions, PackageService, Transport};
use depot_types::Build;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

const ARCHIVE_SUFFIXES: [&str; 3] = [".tar.gz", ".tgz", ".tar"];

/// Resolve a build, download its primary artifact into `dest_dir` and
/// optionally verify and unpack it
///
/// The artifact lands at `dest_dir/<filename>`. Archives are unpacked into
/// `dest_dir/<filename without .tar, .tar.gz or .tgz>`. Failed steps are not
/// retried; with `resume` set, running the same request again continues a
/// partial file.
///
/// # Errors
///
/// Returns catalog errors from resolving the build, transfer errors from the
/// download, `VerifyError` if the build has no artifact or the checksum does
/// not match (the corrupt file is removed), `ArchiveError` if the artifact
/// name is not a plain file name or unpacking fails, and I/O errors for the
/// local file.
pub async fn fetch_build<T: Transport>(
    service: &PackageService<T>,
    request: &FetchRequest,
    dest_dir: &Path,
) -> Result<FetchReport, Error> {
    let start = Instant::now();

    let build = service
        .get_build(&request.product, &request.version, &request.hash)
        .await?;
    let filename = primary_filename(&build)?;

    fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dest_dir))?;
    let artifact_path = dest_dir.join(&filename);

    let (mut file, start_byte) = open_artifact(&artifact_path, request.resume).await?;
    if start_byte > 0 {
        service.emit_debug(format!(
            "Continuing {} from byte {start_byte}",
            artifact_path.display()
        ));
    }

    let options = DownloadOptions {
        start_byte,
        quiet: request.quiet,
        progress_output: None,
    };
    let downloaded = service
        .download_artifact_with(&request.product, &build, &mut file, options)
        .await;
    // Keep whatever arrived so a later run can resume
    file.shutdown()
        .await
        .map_err(|e| Error::io_with_path(&e, &artifact_path))?;
    drop(file);
    let downloaded = downloaded?;

    let checksum = if request.verify {
        verify_file(service, &build, &filename, &artifact_path).await?
    } else {
        ChecksumStatus::Unchecked
    };

    let extracted_to = if request.extract {
        extraction_dir(dest_dir, &filename)
    } else {
        None
    };
    let extract = match &extracted_to {
        Some(target) => {
            let extractor = service
                .event_sender()
                .cloned()
                .map_or_else(Extractor::new, Extractor::with_events);
            Some(extractor.extract_all_file(&artifact_path, target).await?)
        }
        None => None,
    };

    let report = FetchReport {
        build,
        artifact_path,
        bytes_downloaded: downloaded.bytes_written,
        resumed_from: start_byte,
        checksum,
        extracted_to,
        extract,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    tracing::info!(
        product = %request.product,
        version = %report.build.version,
        path = %report.artifact_path.display(),
        bytes = report.bytes_downloaded,
        duration_ms = report.duration_ms,
        "fetch completed"
    );
    Ok(report)
}

/// File name of the build's primary artifact, refusing anything with a path
fn primary_filename(build: &Build) -> Result<String, Error> {
    let artifact = build
        .primary_artifact()
        .ok_or_else(|| VerifyError::MissingArtifact {
            version: build.version.clone(),
            hash: build.hash.clone(),
        })?;

    let name = &artifact.filename;
    match Path::new(name).file_name() {
        Some(base) if base == name.as_str() => Ok(name.clone()),
        _ => Err(ArchiveError::PathTraversal {
            entry: name.clone(),
        }
        .into()),
    }
}

/// Open the artifact file for writing, returning the offset to resume from
async fn open_artifact(path: &Path, resume: bool) -> Result<(File, u64), Error> {
    let io_error = |e: std::io::Error| Error::io_with_path(&e, path);

    if resume {
        match fs::metadata(path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                let file = OpenOptions::new()
                    .append(true)
                    .open(path)
                    .await
                    .map_err(io_error)?;
                return Ok((file, meta.len()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(e)),
        }
    }

    let file = File::create(path).await.map_err(io_error)?;
    Ok((file, 0))
}

async fn verify_file<T: Transport>(
    service: &PackageService<T>,
    build: &Build,
    filename: &str,
    path: &Path,
) -> Result<ChecksumStatus, Error> {
    let reader = File::open(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;

    let outcome = match verify_artifact_checksum(reader, build).await {
        Ok(outcome) => outcome,
        Err(err) => {
            if matches!(err, Error::Verify(VerifyError::ChecksumMismatch { .. })) {
                // A resumed run would only append to the bad bytes
                tracing::warn!(path = %path.display(), "removing artifact that failed verification");
                match fs::remove_file(path).await {
                    Ok(()) => service.emit_warning(format!(
                        "Removed {} after a checksum mismatch",
                        path.display()
                    )),
                    Err(e) => service.emit_error(format!(
                        "Failed to remove corrupt artifact {}: {e}",
                        path.display()
                    )),
                }
            }
            return Err(err);
        }
    };

    let (status, digest, skipped) = match outcome {
        ChecksumOutcome::Verified(digest) => {
            (ChecksumStatus::Verified(digest), digest.to_hex(), false)
        }
        ChecksumOutcome::NotPublished => (ChecksumStatus::NotPublished, String::new(), true),
    };
    service.emit(AppEvent::Download(DownloadEvent::VerificationCompleted {
        filename: filename.to_string(),
        digest,
        skipped,
    }));
    Ok(status)
}

/// The artifact name without its archive suffix, if it is a tar archive
fn archive_stem(filename: &str) -> Option<&str> {
    ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| filename.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
}

/// Directory an archive artifact is unpacked into
#[must_use]
pub fn extraction_dir(dest_dir: &Path, filename: &str) -> Option<PathBuf> {
    archive_stem(filename).map(|stem| dest_dir.join(stem))
}
