use crate::sink::{AppendSink, SinkError};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Sink backed by an append-mode file handle.
///
/// A mutex serializes concurrent writers and each record is issued as one
/// contiguous `write_all` of line plus terminator, so readers never see two
/// lines interleaved or a line split across another write.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Open `path` for appending, creating it if necessary.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileSink { file: Mutex::new(file) })
    }

    /// Wrap an already-open handle. The handle should be in append mode.
    pub fn from_file(file: File) -> Self {
        FileSink { file: Mutex::new(file) }
    }
}

impl AppendSink for FileSink {
    fn append_line(&self, line: &str) -> Result<(), SinkError> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(&buf)?;
        Ok(())
    }
}
