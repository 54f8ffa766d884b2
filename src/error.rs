//! Error types
//!
//! A single error type covers framing, persistence, transport and
//! configuration failures. No failure is retried: every variant ends the
//! session it occurs in, except [`Error::Closed`] which marks an intentional
//! shutdown and should not be reported as an operational error.

use std::io;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relay operations
#[derive(Debug)]
pub enum Error {
    /// Transport read/write failure
    Io(io::Error),
    /// The stream does not start with the FLV signature
    MalformedStream {
        /// The first three bytes that were received instead
        magic: [u8; 3],
    },
    /// The framer was closed; further input is refused
    Closed,
    /// Writing to a persistence target failed
    Sink(io::Error),
    /// Invalid or unreadable configuration
    Config(String),
}

impl Error {
    /// Whether this is the closed sentinel rather than a genuine failure
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::MalformedStream { magic } => {
                write!(f, "Not an FLV stream (magic={:?})", String::from_utf8_lossy(magic))
            }
            Error::Closed => write!(f, "Framer closed"),
            Error::Sink(e) => write!(f, "Sink write failed: {}", e),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) | Error::Sink(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
