//! Byte-oriented access to feature files
//!
//! [`FrameFile`] is the thin layer between the codecs and the storage medium:
//! line reads for text headers, fixed-size raw reads and writes for frames, and
//! absolute seeks. Reaching the end of the data is reported as a normal result,
//! distinct from I/O failures. Every call that reaches the medium is counted in
//! [`IoStats`].

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::stream::FeatureError;

/// Longest text line accepted by [`FrameFile::read_line`]
pub const MAX_LINE_LENGTH: usize = 4096;

const LINE_CHUNK: usize = 128;

/// Counters for calls that reached the underlying medium
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    /// Raw and line read calls
    pub reads: u64,
    /// Bytes consumed by reads
    pub bytes_read: u64,
    /// Raw write calls
    pub writes: u64,
    /// Bytes written
    pub bytes_written: u64,
    /// Repositioning calls
    pub seeks: u64,
}

impl fmt::Display for IoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reads ({} bytes), {} writes ({} bytes), {} seeks",
            self.reads, self.bytes_read, self.writes, self.bytes_written, self.seeks
        )
    }
}

/// Sequential reader/writer over a seekable byte stream
#[derive(Debug)]
pub struct FrameFile<S = File> {
    inner: S,
    position: u64,
    len: u64,
    stats: IoStats,
}

impl FrameFile<File> {
    /// Open an existing file, for reading only or for reading and writing
    pub fn open(path: &Path, writable: bool) -> Result<Self, FeatureError> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|e| open_error(e, path))?;
        Self::new(file)
    }

    /// Create or truncate a file for reading and writing
    pub fn create(path: &Path) -> Result<Self, FeatureError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| open_error(e, path))?;
        Self::new(file)
    }
}

fn open_error(err: io::Error, path: &Path) -> FeatureError {
    if err.kind() == io::ErrorKind::NotFound {
        FeatureError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        FeatureError::Io(err)
    }
}

impl<S: Seek> FrameFile<S> {
    /// Wrap a seekable stream, measuring its length
    pub fn new(mut inner: S) -> Result<Self, FeatureError> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            position: 0,
            len,
            stats: IoStats::default(),
        })
    }

    /// Current length of the stream in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when the stream holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current byte position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Call counters since the stream was wrapped
    pub fn stats(&self) -> IoStats {
        self.stats
    }

    /// Move to an absolute byte offset. Already being there costs nothing.
    pub fn seek(&mut self, offset: u64) -> Result<(), FeatureError> {
        if offset != self.position {
            self.inner.seek(SeekFrom::Start(offset))?;
            self.stats.seeks += 1;
            self.position = offset;
        }
        Ok(())
    }

    /// Release the wrapped stream
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read + Seek> FrameFile<S> {
    /// Read one `\n`-terminated line, without the terminator.
    ///
    /// Returns `Ok(None)` at end of stream. Lines longer than
    /// [`MAX_LINE_LENGTH`] or not valid UTF-8 are invalid data.
    pub fn read_line(&mut self) -> Result<Option<String>, FeatureError> {
        let start = self.position;
        let mut line = Vec::new();
        let mut chunk = [0u8; LINE_CHUNK];

        loop {
            let n = self.inner.read(&mut chunk)?;
            self.stats.reads += 1;
            self.stats.bytes_read += n as u64;
            if n == 0 {
                self.position = start + line.len() as u64;
                if line.is_empty() {
                    return Ok(None);
                }
                break;
            }
            if let Some(end) = chunk[..n].iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&chunk[..end]);
                let next = start + line.len() as u64 + 1;
                // Give back what was read past the terminator
                self.inner.seek(SeekFrom::Start(next))?;
                self.position = next;
                break;
            }
            line.extend_from_slice(&chunk[..n]);
            if line.len() > MAX_LINE_LENGTH {
                self.position = start + line.len() as u64;
                return Err(FeatureError::InvalidData(format!(
                    "text line at byte {} exceeds {} bytes",
                    start, MAX_LINE_LENGTH
                )));
            }
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }
        String::from_utf8(line).map(Some).map_err(|_| {
            FeatureError::InvalidData(format!("text line at byte {} is not valid UTF-8", start))
        })
    }

    /// Fill `buf` completely from the current position.
    ///
    /// Returns `Ok(false)` without consuming anything when fewer than
    /// `buf.len()` bytes remain.
    pub fn read_raw(&mut self, buf: &mut [u8]) -> Result<bool, FeatureError> {
        if self.position + buf.len() as u64 > self.len {
            return Ok(false);
        }
        self.stats.reads += 1;
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                self.stats.bytes_read += buf.len() as u64;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                // The medium shrank underneath us
                self.position = self.inner.stream_position()?;
                self.len = self.position;
                Ok(false)
            }
            Err(e) => {
                self.position = self.inner.stream_position()?;
                Err(e.into())
            }
        }
    }
}

impl<S: Write + Seek> FrameFile<S> {
    /// Write all of `bytes` at the current position, growing the stream
    /// when writing past its end.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), FeatureError> {
        self.stats.writes += 1;
        if let Err(e) = self.inner.write_all(bytes) {
            self.position = self.inner.stream_position()?;
            self.len = self.len.max(self.position);
            return Err(e.into());
        }
        self.position += bytes.len() as u64;
        self.len = self.len.max(self.position);
        self.stats.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Push buffered bytes to the medium
    pub fn flush(&mut self) -> Result<(), FeatureError> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_lines_then_raw() {
        let data = b"<header>\nsource = 0 a\n</header>\n\x01\x02\x03\x04".to_vec();
        let mut file = FrameFile::new(Cursor::new(data)).unwrap();

        assert_eq!(file.read_line().unwrap().as_deref(), Some("<header>"));
        assert_eq!(file.read_line().unwrap().as_deref(), Some("source = 0 a"));
        assert_eq!(file.read_line().unwrap().as_deref(), Some("</header>"));
        assert_eq!(file.position(), 32);

        let mut buf = [0u8; 4];
        assert!(file.read_raw(&mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);
        assert!(!file.read_raw(&mut buf).unwrap());
    }

    #[test]
    fn test_read_line_at_end() {
        let mut file = FrameFile::new(Cursor::new(b"tail".to_vec())).unwrap();
        assert_eq!(file.read_line().unwrap().as_deref(), Some("tail"));
        assert_eq!(file.read_line().unwrap(), None);
    }

    #[test]
    fn test_read_raw_short_stream_is_end_not_error() {
        let mut file = FrameFile::new(Cursor::new(vec![0u8; 3])).unwrap();
        let mut buf = [0u8; 4];
        assert!(!file.read_raw(&mut buf).unwrap());
        assert_eq!(file.position(), 0);
    }

    #[test]
    fn test_write_extends_length_and_counts_calls() {
        let mut file = FrameFile::new(Cursor::new(Vec::new())).unwrap();
        file.write_raw(&[1, 2, 3]).unwrap();
        file.seek(1).unwrap();
        file.write_raw(&[9, 9, 9]).unwrap();
        assert_eq!(file.len(), 4);

        let stats = file.stats();
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.bytes_written, 6);
        assert_eq!(stats.seeks, 1);
        assert_eq!(file.into_inner().into_inner(), vec![1, 9, 9, 9]);
    }

    #[test]
    fn test_seek_to_current_position_is_free() {
        let mut file = FrameFile::new(Cursor::new(vec![0u8; 16])).unwrap();
        file.seek(0).unwrap();
        file.seek(8).unwrap();
        file.seek(8).unwrap();
        assert_eq!(file.stats().seeks, 1);
    }

    #[test]
    fn test_open_missing_file_is_not_found() {
        let err = FrameFile::open(Path::new("/nonexistent/dir/file.prm"), false).unwrap_err();
        assert!(matches!(err, FeatureError::NotFound { .. }));
    }
}
