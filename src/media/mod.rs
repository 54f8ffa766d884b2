//! FLV media handling
//!
//! This module provides:
//! - FLV header and tag layout (parsing and generation)
//! - Incremental tag framing of a chunked byte stream

pub mod flv;
pub mod framer;

pub use flv::{FlvHeader, FlvTagType, TagHeader};
pub use framer::{TagFramer, TagHandler};
