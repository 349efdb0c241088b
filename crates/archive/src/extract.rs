//! Unpacking archive entries to disk

use crate::path::{
    matches_entry_name, sanitize_entry_path, sanitize_hardlink_target, sanitize_symlink_target,
    symlinked_ancestor,
};
use crate::stream::open_tar_stream;
use depot_errors::{ArchiveError, Error};
use depot_events::{AppEvent, ArchiveEvent, EventEmitter, EventSender};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, Entry, EntryType};

const DEFAULT_DIR_MODE: u32 = 0o755;
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Counts of what an extraction run produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Regular files and hard links written
    pub files: usize,
    /// Directory entries created
    pub directories: usize,
    /// Symbolic links created
    pub symlinks: usize,
    /// Entries of other types that were passed over
    pub skipped: usize,
}

/// What a single entry turned into
enum Unpacked {
    File,
    Directory,
    Symlink,
    Skipped,
}

/// Archive extractor that reports progress through events
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    event_sender: Option<EventSender>,
}

impl EventEmitter for Extractor {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Extractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_events(event_sender: EventSender) -> Self {
        Self {
            event_sender: Some(event_sender),
        }
    }

    /// Extract every entry of a tar or tar.gz stream below `dest`
    ///
    /// # Errors
    ///
    /// Fails on the first unsafe entry name or link target, on a malformed
    /// archive and on filesystem errors. Earlier entries are not rolled back.
    pub fn extract_all<R: Read>(&self, reader: R, dest: &Path) -> Result<ExtractReport, ArchiveError> {
        self.run(reader, dest, None)
    }

    /// Extract the first entry matching `entry_name` below `dest`
    ///
    /// An entry matches when its cleaned path equals `entry_name` (a leading
    /// `./` is ignored on both sides) or when `entry_name` is a bare file name
    /// equal to the entry's base name. Scanning stops at the first match.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::EntryNotFound` when the archive ends without a
    /// match, plus the errors of [`Extractor::extract_all`].
    pub fn extract_one<R: Read>(
        &self,
        reader: R,
        dest: &Path,
        entry_name: &str,
    ) -> Result<ExtractReport, ArchiveError> {
        self.run(reader, dest, Some(entry_name))
    }

    /// Extract every entry of the archive file at `archive_path`
    ///
    /// The blocking work runs on the tokio blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be opened, extraction fails or
    /// the blocking task panics.
    pub async fn extract_all_file(&self, archive_path: &Path, dest: &Path) -> Result<ExtractReport, Error> {
        self.run_file(archive_path, dest, None).await
    }

    /// Extract one entry of the archive file at `archive_path`
    ///
    /// # Errors
    ///
    /// See [`Extractor::extract_one`] and [`Extractor::extract_all_file`].
    pub async fn extract_one_file(
        &self,
        archive_path: &Path,
        dest: &Path,
        entry_name: &str,
    ) -> Result<ExtractReport, Error> {
        self.run_file(archive_path, dest, Some(entry_name.to_string()))
            .await
    }

    async fn run_file(
        &self,
        archive_path: &Path,
        dest: &Path,
        entry_name: Option<String>,
    ) -> Result<ExtractReport, Error> {
        let extractor = self.clone();
        let archive_path = archive_path.to_path_buf();
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let file = File::open(&archive_path).map_err(|e| Error::io_with_path(&e, &archive_path))?;
            extractor
                .run(file, &dest, entry_name.as_deref())
                .map_err(Error::from)
        })
        .await
        .map_err(|e| Error::internal(format!("extract task failed: {e}")))?
    }

    fn run<R: Read>(
        &self,
        reader: R,
        dest: &Path,
        wanted: Option<&str>,
    ) -> Result<ExtractReport, ArchiveError> {
        let destination = dest.display().to_string();
        create_dirs(dest)?;
        self.emit(AppEvent::Archive(ArchiveEvent::Started {
            destination: destination.clone(),
        }));

        let mut archive = Archive::new(open_tar_stream(reader)?);
        let entries = archive.entries().map_err(malformed)?;

        let mut report = ExtractReport::default();
        let mut found = false;
        for entry in entries {
            let mut entry = entry.map_err(malformed)?;
            let raw_path = entry.path().map_err(malformed)?.into_owned();

            if let Some(wanted) = wanted {
                if !matches_entry_name(&raw_path, wanted) {
                    continue;
                }
            }

            let relative = sanitize_entry_path(&raw_path)?;
            match self.unpack(&mut entry, dest, &relative)? {
                Unpacked::File => report.files += 1,
                Unpacked::Directory => report.directories += 1,
                Unpacked::Symlink => report.symlinks += 1,
                Unpacked::Skipped => report.skipped += 1,
            }

            if wanted.is_some() {
                found = true;
                break;
            }
        }

        if let Some(wanted) = wanted {
            if !found {
                return Err(ArchiveError::EntryNotFound {
                    entry: wanted.to_string(),
                });
            }
        }

        self.emit(AppEvent::Archive(ArchiveEvent::Completed {
            destination,
            files: report.files,
            directories: report.directories,
            symlinks: report.symlinks,
            skipped: report.skipped,
        }));
        Ok(report)
    }

    fn unpack<R: Read>(
        &self,
        entry: &mut Entry<'_, R>,
        dest: &Path,
        relative: &Path,
    ) -> Result<Unpacked, ArchiveError> {
        if relative.as_os_str().is_empty() {
            // "./" and friends name the destination itself
            tracing::debug!(entry = ?entry.path_bytes(), "skipping entry for the archive root");
            return Ok(if entry.header().entry_type().is_dir() {
                Unpacked::Directory
            } else {
                Unpacked::Skipped
            });
        }

        if let Some(link) = symlinked_ancestor(dest, relative) {
            return Err(ArchiveError::UnsafeLinkTarget {
                entry: relative.display().to_string(),
                target: link.display().to_string(),
            });
        }

        let target = dest.join(relative);
        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().ok().map(|mode| mode & 0o7777);

        let unpacked = if entry_type.is_dir() {
            refuse_symlink(relative, &target)?;
            create_dirs(&target)?;
            set_mode(&target, mode.unwrap_or(DEFAULT_DIR_MODE))?;
            Unpacked::Directory
        } else if entry_type.is_file() || entry_type.is_contiguous() {
            write_file(entry, &target, mode.unwrap_or(DEFAULT_FILE_MODE))?;
            Unpacked::File
        } else if entry_type.is_symlink() {
            let link_target = link_name(entry, relative)?;
            sanitize_symlink_target(dest, relative, &link_target)?;
            create_symlink(&link_target, &target)?;
            Unpacked::Symlink
        } else if entry_type.is_hard_link() {
            let link_target = link_name(entry, relative)?;
            let source = dest.join(sanitize_hardlink_target(dest, relative, &link_target)?);
            create_parent(&target)?;
            remove_existing(&target)?;
            fs::hard_link(&source, &target).map_err(|e| io_error(&target, &e))?;
            Unpacked::File
        } else {
            let kind = entry_kind(entry_type);
            tracing::debug!(path = %relative.display(), kind, "skipping unsupported entry type");
            self.emit(AppEvent::Archive(ArchiveEvent::EntrySkipped {
                path: relative.display().to_string(),
                kind: kind.to_string(),
            }));
            return Ok(Unpacked::Skipped);
        };

        self.emit(AppEvent::Archive(ArchiveEvent::EntryExtracted {
            path: relative.display().to_string(),
        }));
        Ok(unpacked)
    }
}

/// Extract every entry of `reader` below `dest` without event reporting
///
/// # Errors
///
/// See [`Extractor::extract_all`].
pub fn extract_all<R: Read>(reader: R, dest: &Path) -> Result<ExtractReport, ArchiveError> {
    Extractor::new().extract_all(reader, dest)
}

/// Extract the entry named `entry_name` below `dest` without event reporting
///
/// # Errors
///
/// See [`Extractor::extract_one`].
pub fn extract_one<R: Read>(
    reader: R,
    dest: &Path,
    entry_name: &str,
) -> Result<ExtractReport, ArchiveError> {
    Extractor::new().extract_one(reader, dest, entry_name)
}

fn write_file<R: Read>(entry: &mut Entry<'_, R>, target: &Path, mode: u32) -> Result<(), ArchiveError> {
    create_parent(target)?;
    remove_existing(target)?;

    let mut file = File::create(target).map_err(|e| io_error(target, &e))?;
    io::copy(entry, &mut file).map_err(|e| io_error(target, &e))?;
    file.flush().map_err(|e| io_error(target, &e))?;
    drop(file);

    set_mode(target, mode)
}

fn link_name<R: Read>(entry: &Entry<'_, R>, relative: &Path) -> Result<PathBuf, ArchiveError> {
    match entry.link_name().map_err(malformed)? {
        Some(target) => Ok(target.into_owned()),
        None => Err(ArchiveError::Malformed {
            message: format!("link entry {} has no target", relative.display()),
        }),
    }
}

fn entry_kind(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Char => "character device",
        EntryType::Block => "block device",
        EntryType::Fifo => "fifo",
        EntryType::XGlobalHeader => "pax global header",
        EntryType::GNUSparse => "sparse file",
        _ => "unknown",
    }
}

/// Directory entries must not land on a link left by an earlier entry
fn refuse_symlink(relative: &Path, target: &Path) -> Result<(), ArchiveError> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => Err(ArchiveError::UnsafeLinkTarget {
            entry: relative.display().to_string(),
            target: fs::read_link(target)
                .map(|link| link.display().to_string())
                .unwrap_or_default(),
        }),
        _ => Ok(()),
    }
}

/// Create `path` and any missing parents with mode 0755
fn create_dirs(path: &Path) -> Result<(), ArchiveError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DEFAULT_DIR_MODE);
    }
    builder.create(path).map_err(|e| io_error(path, &e))
}

fn create_parent(target: &Path) -> Result<(), ArchiveError> {
    match target.parent() {
        Some(parent) => create_dirs(parent),
        None => Ok(()),
    }
}

/// Remove a file or link left at `target` by an earlier entry or run
fn remove_existing(target: &Path) -> Result<(), ArchiveError> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => Err(ArchiveError::Io {
            path: target.display().to_string(),
            message: "a directory already exists at this path".to_string(),
        }),
        Ok(_) => fs::remove_file(target).map_err(|e| io_error(target, &e)),
        Err(_) => Ok(()),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ArchiveError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| io_error(path, &e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), ArchiveError> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(link_target: &Path, target: &Path) -> Result<(), ArchiveError> {
    create_parent(target)?;
    remove_existing(target)?;
    std::os::unix::fs::symlink(link_target, target).map_err(|e| io_error(target, &e))
}

#[cfg(not(unix))]
fn create_symlink(link_target: &Path, target: &Path) -> Result<(), ArchiveError> {
    tracing::debug!(
        link = %target.display(),
        target = %link_target.display(),
        "symbolic links are not supported on this platform"
    );
    Ok(())
}

fn malformed(err: io::Error) -> ArchiveError {
    ArchiveError::Malformed {
        message: err.to_string(),
    }
}

fn io_error(path: &Path, err: &io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
