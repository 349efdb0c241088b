//! Compression sniffing for tar input

use depot_errors::ArchiveError;
use flate2::bufread::MultiGzDecoder;
use std::io::{self, BufRead, BufReader, Read};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Tar byte stream, gzip-decoded when the input was compressed
pub enum TarStream<R: Read> {
    Plain(BufReader<R>),
    Gzip(MultiGzDecoder<BufReader<R>>),
}

impl<R: Read> TarStream<R> {
    #[must_use]
    pub fn is_gzip(&self) -> bool {
        matches!(self, Self::Gzip(_))
    }
}

impl<R: Read> Read for TarStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(reader) => reader.read(buf),
            Self::Gzip(decoder) => decoder.read(buf),
        }
    }
}

impl<R: Read> std::fmt::Debug for TarStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_gzip() {
            "TarStream::Gzip"
        } else {
            "TarStream::Plain"
        })
    }
}

/// Open a tar stream over `reader`, decompressing gzip input transparently
///
/// Detection looks at the gzip magic bytes only; a corrupt gzip body is
/// reported later, when the stream is read. Concatenated gzip members are
/// decoded as one stream.
///
/// # Errors
///
/// Returns `ArchiveError::Malformed` if the first bytes cannot be read.
pub fn open_tar_stream<R: Read>(reader: R) -> Result<TarStream<R>, ArchiveError> {
    let mut reader = BufReader::new(reader);
    let head = reader.fill_buf().map_err(|e| ArchiveError::Malformed {
        message: format!("cannot read archive header: {e}"),
    })?;

    if head.starts_with(&GZIP_MAGIC) {
        Ok(TarStream::Gzip(MultiGzDecoder::new(reader)))
    } else {
        Ok(TarStream::Plain(reader))
    }
}
