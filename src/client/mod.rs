//! Client helpers
//!
//! Small building blocks for tools and tests that talk to a running relay:
//! - [`publisher`]: push an FLV byte stream to the ingest port
//! - [`player`]: pull the live stream over HTTP and split it into units

pub mod player;
pub mod publisher;

pub use player::{connect, open_live, TagReader};
pub use publisher::Publisher;
