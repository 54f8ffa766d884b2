//! Incremental FLV tag framer
//!
//! Turns an arbitrarily chunked byte stream into whole FLV units. Reads from
//! the transport never line up with tag boundaries, so input is accumulated
//! in a buffer and only complete units are split off and handed downstream:
//!
//! ```text
//!   feed(&[..]) ──► BytesMut ──► [header unit] ──► handler.on_tag()
//!                     │
//!                     └────────► [tag][tag][par ──► handler.on_tag() x2,
//!                                                   partial tag kept
//! ```
//!
//! Emitted units are `Bytes` split from the buffer, so they share the
//! allocation instead of being copied.

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};

use super::flv::{self, FlvHeader, MIN_HEADER_FRAMING, MIN_TAG_SIZE};

/// Receives complete units from a [`TagFramer`]
pub trait TagHandler {
    /// Called once with the header unit, then once per forwarded tag
    fn on_tag(&mut self, unit: Bytes) -> Result<()>;
}

impl<F> TagHandler for F
where
    F: FnMut(Bytes) -> Result<()>,
{
    fn on_tag(&mut self, unit: Bytes) -> Result<()> {
        self(unit)
    }
}

/// Stateful FLV framer for one ingest stream
pub struct TagFramer<H: TagHandler> {
    buf: BytesMut,
    header_emitted: bool,
    closed: bool,
    handler: H,
}

impl<H: TagHandler> TagFramer<H> {
    /// Create a framer that delivers units to `handler`
    pub fn new(handler: H) -> Self {
        Self {
            buf: BytesMut::new(),
            header_emitted: false,
            closed: false,
            handler,
        }
    }

    /// Feed the next chunk of the stream.
    ///
    /// May invoke the handler zero, one or many times. Incomplete data is
    /// kept until a later call completes it.
    pub fn feed(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        if data.is_empty() {
            return Ok(());
        }
        self.buf.extend_from_slice(data);

        if !self.header_emitted && !self.emit_header()? {
            return Ok(());
        }

        while self.buf.len() >= MIN_TAG_SIZE {
            let tag_type = flv::FlvTagType::from_u8(self.buf[0]);
            let unit_size = MIN_TAG_SIZE + flv::read_u24(&self.buf[1..4]) as usize;
            if self.buf.len() < unit_size {
                break;
            }

            let unit = self.buf.split_to(unit_size).freeze();
            if tag_type.is_forwarded() {
                self.handler.on_tag(unit)?;
            } else {
                tracing::trace!(tag_type = tag_type.as_u8(), size = unit_size, "Skipping tag");
            }
        }

        Ok(())
    }

    /// Emit the header unit if enough bytes are buffered.
    ///
    /// Returns whether the header has now been emitted.
    fn emit_header(&mut self) -> Result<bool> {
        if self.buf.len() < MIN_HEADER_FRAMING {
            return Ok(false);
        }
        if !flv::has_signature(&self.buf) {
            return Err(Error::MalformedStream {
                magic: [self.buf[0], self.buf[1], self.buf[2]],
            });
        }

        let header = match FlvHeader::parse(&self.buf) {
            Some(header) => header,
            None => return Ok(false),
        };
        if self.buf.len() < header.unit_size() {
            return Ok(false);
        }

        let unit = self.buf.split_to(header.unit_size()).freeze();
        self.header_emitted = true;

        tracing::debug!(
            version = header.version,
            has_audio = header.has_audio(),
            has_video = header.has_video(),
            "FLV header received"
        );

        self.handler.on_tag(unit)?;
        Ok(true)
    }

    /// Discard buffered data. Later calls to [`feed`](Self::feed) return
    /// [`Error::Closed`].
    pub fn close(&mut self) {
        self.buf = BytesMut::new();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_header_emitted(&self) -> bool {
        self.header_emitted
    }

    /// Number of bytes waiting for the rest of their unit
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}
