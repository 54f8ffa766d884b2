//! File-backed sink

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bytes::Bytes;

use super::Sink;

enum Target {
    Direct(File),
    Buffered(BufWriter<File>),
}

/// Appends raw bytes to one file for the lifetime of an ingest session
pub struct FileSink {
    target: Option<Target>,
    bytes_written: u64,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    ///
    /// With `write_buffer == 0` every write goes straight to the file;
    /// otherwise writes are buffered up to that many bytes and flushed on
    /// close.
    pub fn create(path: impl AsRef<Path>, write_buffer: usize) -> io::Result<Self> {
        let file = File::create(path)?;
        let target = if write_buffer == 0 {
            Target::Direct(file)
        } else {
            Target::Buffered(BufWriter::with_capacity(write_buffer, file))
        };

        Ok(Self {
            target: Some(target),
            bytes_written: 0,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn is_closed(&self) -> bool {
        self.target.is_none()
    }
}

impl Sink for FileSink {
    fn write(&mut self, data: &Bytes) -> io::Result<()> {
        match self.target.as_mut() {
            Some(Target::Direct(file)) => file.write_all(data)?,
            Some(Target::Buffered(writer)) => writer.write_all(data)?,
            None => return Ok(()),
        }
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.target.take() {
            Some(Target::Direct(file)) => file.sync_all(),
            Some(Target::Buffered(writer)) => {
                let file = writer.into_inner().map_err(|e| e.into_error())?;
                file.sync_all()
            }
            None => Ok(()),
        }
    }
}
