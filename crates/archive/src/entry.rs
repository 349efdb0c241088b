//! Lazy access to a single archive member

use crate::path::matches_base_name;
use crate::stream::{open_tar_stream, TarStream};
use depot_errors::ArchiveError;
use std::io::{self, Read};
use std::path::Path;
use tar::Archive;

/// Forward-only reader over the data of one archive entry
///
/// Owns the underlying stream; reading it to the end consumes the archive up
/// to the end of the entry. A corrupt compressed body shows up as a read
/// error.
pub struct EntryStream<R: Read> {
    inner: io::Take<Positioned<TarStream<R>>>,
    path: String,
    size: u64,
}

impl<R: Read> EntryStream<R> {
    /// Full path of the entry inside the archive
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Size of the entry data as declared by its header
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes not yet read
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }
}

impl<R: Read> Read for EntryStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() && self.inner.limit() > 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("archive ended inside entry {}", self.path),
            ));
        }
        Ok(n)
    }
}

impl<R: Read> std::fmt::Debug for EntryStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStream")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("remaining", &self.inner.limit())
            .finish()
    }
}

/// Reader that counts the bytes handed out so far
struct Positioned<R> {
    inner: R,
    pos: u64,
}

impl<R: Read> Read for Positioned<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// Where the matching entry's data starts
struct Located {
    path: String,
    size: u64,
    data_start: u64,
}

/// Return the data of the first regular file whose base name is `entry_name`
///
/// Nothing is written to disk. Headers are walked with [`tar::Archive`], so
/// GNU long names and PAX records are honoured; the archive is then dropped
/// and the returned stream picks up at the start of the entry data.
///
/// # Errors
///
/// Returns `ArchiveError::EntryNotFound` if the archive ends without a match
/// and `ArchiveError::Malformed` for corrupt headers or compressed data.
pub fn stream_entry<R: Read>(reader: R, entry_name: &str) -> Result<EntryStream<R>, ArchiveError> {
    let mut stream = Positioned {
        inner: open_tar_stream(reader)?,
        pos: 0,
    };

    let located = locate(&mut stream, Path::new(entry_name))?.ok_or_else(|| {
        ArchiveError::EntryNotFound {
            entry: entry_name.to_string(),
        }
    })?;

    // tar reads headers block by block, so the stream sits at the data
    match located.data_start.checked_sub(stream.pos) {
        Some(0) => {}
        Some(gap) => {
            let skipped = io::copy(&mut (&mut stream).take(gap), &mut io::sink()).map_err(malformed)?;
            if skipped != gap {
                return Err(ArchiveError::Malformed {
                    message: "archive ends inside an entry".to_string(),
                });
            }
        }
        None => {
            return Err(ArchiveError::Malformed {
                message: format!("reader moved past the data of {}", located.path),
            })
        }
    }

    tracing::debug!(entry = %located.path, size = located.size, "streaming archive entry");
    Ok(EntryStream {
        inner: stream.take(located.size),
        path: located.path,
        size: located.size,
    })
}

fn locate<R: Read>(stream: &mut R, wanted: &Path) -> Result<Option<Located>, ArchiveError> {
    let mut archive = Archive::new(stream);
    for entry in archive.entries().map_err(malformed)? {
        let entry = entry.map_err(malformed)?;
        let entry_type = entry.header().entry_type();
        if !(entry_type.is_file() || entry_type.is_contiguous()) {
            continue;
        }
        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if matches_base_name(Path::new(&path), wanted) {
            return Ok(Some(Located {
                path,
                size: entry.size(),
                data_start: entry.raw_file_position(),
            }));
        }
    }
    Ok(None)
}

fn malformed(err: io::Error) -> ArchiveError {
    ArchiveError::Malformed {
        message: err.to_string(),
    }
}
