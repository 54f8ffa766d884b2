//! Live stream player
//!
//! ```text
//!   open_live() ──GET /live.flv──► relay
//!        │
//!        ▼
//!   TagReader ──read──► TagFramer ──► queue ──► next_unit()
//! ```

use std::collections::VecDeque;
use std::io;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::media::framer::{TagFramer, TagHandler};

const READ_CHUNK: usize = 4096;

/// Open a TCP connection to `host:port`
pub async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let stream = TcpStream::connect((host, port)).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Request `/live.flv` and return a reader positioned at the start of the body.
///
/// Uses HTTP/1.0 so the body is delimited by connection close.
pub async fn open_live(host: &str, port: u16) -> Result<TagReader<BufReader<TcpStream>>> {
    let mut stream = connect(host, port).await?;
    let request = format!("GET /live.flv HTTP/1.0\r\nHost: {}:{}\r\n\r\n", host, port);
    stream.write_all(request.as_bytes()).await?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let status = line.split_whitespace().nth(1).unwrap_or_default();
    if status != "200" {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unexpected response: {}", line.trim_end()),
        )));
    }

    // Skip headers
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(Error::Io(io::ErrorKind::UnexpectedEof.into()));
        }
        if line == "\r\n" || line == "\n" {
            break;
        }
    }

    Ok(TagReader::new(reader))
}

#[derive(Default)]
struct UnitQueue(VecDeque<Bytes>);

impl TagHandler for UnitQueue {
    fn on_tag(&mut self, unit: Bytes) -> Result<()> {
        self.0.push_back(unit);
        Ok(())
    }
}

/// Splits a raw FLV byte stream into header and tag units
pub struct TagReader<R> {
    reader: R,
    framer: TagFramer<UnitQueue>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> TagReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            framer: TagFramer::new(UnitQueue::default()),
            buf: vec![0u8; READ_CHUNK],
        }
    }

    /// Next complete unit, or `None` at end of stream.
    ///
    /// The first unit is the FLV header (with its trailing previous-tag-size
    /// field); each later unit is one tag. Bytes of a trailing partial tag are
    /// discarded at end of stream.
    pub async fn next_unit(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(unit) = self.framer.handler_mut().0.pop_front() {
                return Ok(Some(unit));
            }

            let n = self.reader.read(&mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }
            self.framer.feed(&self.buf[..n])?;
        }
    }

    /// Bytes received but not yet part of a complete unit
    pub fn buffered(&self) -> usize {
        self.framer.buffered()
    }
}
