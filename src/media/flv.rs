//! FLV wire layout
//!
//! An FLV stream is a file header, a zero `PreviousTagSize0`, and a sequence
//! of tags, each followed by its own total size:
//!
//! ```text
//! +============+==================+==============+==================+
//! | FLV Header | PrevTagSize0 (0) | Tag 1        | PrevTagSize1 ... |
//! | (9 bytes)  | (4 bytes)        | (11+N bytes) | (4 bytes)        |
//! +============+==================+==============+==================+
//! ```
//!
//! Tag header:
//! ```text
//! +--------+-------------+-----------+-------------+---------+
//! | Type(1)| DataSize(3) | TS(3+1)   | StreamID(3) | Data(N) |
//! +--------+-------------+-----------+-------------+---------+
//! ```
//!
//! Only the framing is interpreted here; payloads are passed through as-is.

use bytes::{BufMut, Bytes, BytesMut};

/// FLV file signature: "FLV" in ASCII
pub const FLV_SIGNATURE: [u8; 3] = *b"FLV";

/// Minimum bytes needed before the header length field can be read
/// (9-byte header + 4-byte PreviousTagSize0)
pub const MIN_HEADER_FRAMING: usize = 13;

/// Standard FLV header length
pub const FLV_HEADER_SIZE: u32 = 9;

/// Tag header size
pub const TAG_HEADER_SIZE: usize = 11;

/// Trailing PreviousTagSize field
pub const PREV_TAG_SIZE_LEN: usize = 4;

/// Largest payload a 24-bit DataSize can declare
pub const MAX_TAG_DATA_SIZE: usize = 0xFF_FFFF;

/// Smallest possible tag: header + trailer, no payload
pub const MIN_TAG_SIZE: usize = TAG_HEADER_SIZE + PREV_TAG_SIZE_LEN;

/// Type flags: bit 0 = video, bit 2 = audio
pub const FLAG_VIDEO: u8 = 0x01;
pub const FLAG_AUDIO: u8 = 0x04;

/// FLV tag type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio,
    Video,
    Script,
    /// Any type code outside the forwarded set
    Other(u8),
}

impl FlvTagType {
    pub fn from_u8(b: u8) -> Self {
        match b {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::Script,
            other => FlvTagType::Other(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::Script => 18,
            FlvTagType::Other(b) => *b,
        }
    }

    /// Whether tags of this type are forwarded to recordings and viewers
    pub fn is_forwarded(&self) -> bool {
        !matches!(self, FlvTagType::Other(_))
    }
}

/// Parsed FLV file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    pub version: u8,
    pub flags: u8,
    /// Declared header length (normally 9)
    pub header_length: u32,
}

impl FlvHeader {
    /// Parse the header fields from the start of `buf`.
    ///
    /// Returns `None` if fewer than 9 bytes are available. The signature is
    /// not checked here; see [`has_signature`].
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < FLV_HEADER_SIZE as usize {
            return None;
        }
        Some(Self {
            version: buf[3],
            flags: buf[4],
            header_length: u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]),
        })
    }

    pub fn has_audio(&self) -> bool {
        self.flags & FLAG_AUDIO != 0
    }

    pub fn has_video(&self) -> bool {
        self.flags & FLAG_VIDEO != 0
    }

    /// Size of the header unit emitted downstream (header + PreviousTagSize0).
    ///
    /// Saturates at `usize::MAX`. The declared length has no upper bound, so
    /// the framer keeps buffering until that many bytes have arrived.
    pub fn unit_size(&self) -> usize {
        usize::try_from(self.header_length)
            .unwrap_or(usize::MAX)
            .saturating_add(PREV_TAG_SIZE_LEN)
    }
}

/// Check the 3-byte signature
pub fn has_signature(buf: &[u8]) -> bool {
    buf.len() >= 3 && buf[..3] == FLV_SIGNATURE
}

/// Parsed 11-byte tag header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub tag_type: FlvTagType,
    /// Payload length (24-bit)
    pub data_size: u32,
    /// Timestamp in milliseconds, extension byte applied
    pub timestamp: u32,
    pub stream_id: u32,
}

impl TagHeader {
    /// Parse a tag header from the start of `buf`
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < TAG_HEADER_SIZE {
            return None;
        }
        Some(Self {
            tag_type: FlvTagType::from_u8(buf[0]),
            data_size: read_u24(&buf[1..4]),
            timestamp: read_u24(&buf[4..7]) | ((buf[7] as u32) << 24),
            stream_id: read_u24(&buf[8..11]),
        })
    }

    /// Total bytes the tag occupies on the wire, trailer included
    pub fn unit_size(&self) -> usize {
        TAG_HEADER_SIZE + self.data_size as usize + PREV_TAG_SIZE_LEN
    }
}

/// Read a 24-bit big-endian unsigned integer
pub fn read_u24(b: &[u8]) -> u32 {
    ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32
}

/// Build the header unit: 9-byte header plus PreviousTagSize0
pub fn encode_header(has_audio: bool, has_video: bool) -> Bytes {
    let mut flags = 0;
    if has_audio {
        flags |= FLAG_AUDIO;
    }
    if has_video {
        flags |= FLAG_VIDEO;
    }

    let mut buf = BytesMut::with_capacity(MIN_HEADER_FRAMING);
    buf.put_slice(&FLV_SIGNATURE);
    buf.put_u8(0x01);
    buf.put_u8(flags);
    buf.put_u32(FLV_HEADER_SIZE);
    buf.put_u32(0);
    buf.freeze()
}

/// Build a complete tag with header, payload and trailing PreviousTagSize
///
/// # Panics
///
/// Panics if `data` is longer than [`MAX_TAG_DATA_SIZE`].
pub fn encode_tag(tag_type: FlvTagType, timestamp: u32, data: &[u8]) -> Bytes {
    assert!(
        data.len() <= MAX_TAG_DATA_SIZE,
        "FLV tag payload of {} bytes exceeds the 24-bit DataSize field",
        data.len()
    );
    let data_size = data.len() as u32;
    let mut buf = BytesMut::with_capacity(TAG_HEADER_SIZE + data.len() + PREV_TAG_SIZE_LEN);

    buf.put_u8(tag_type.as_u8());
    buf.put_uint(data_size as u64, 3);

    // Lower 24 bits, then the extension byte
    buf.put_uint(timestamp as u64 & 0xFF_FFFF, 3);
    buf.put_u8((timestamp >> 24) as u8);

    // Stream ID is always 0
    buf.put_uint(0, 3);

    buf.put_slice(data);
    buf.put_u32(TAG_HEADER_SIZE as u32 + data_size);
    buf.freeze()
}
