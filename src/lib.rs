//! Live FLV relay
//!
//! Accepts one FLV byte stream over raw TCP, splits it into header and tag
//! units, records the units to disk, and fans them out to HTTP-FLV viewers.
//!
//! ```text
//!   publisher ──TCP──► TagFramer ──┬──► stream_<peer>.flv
//!                                  └──► LiveHub ──► GET /live.flv (many)
//! ```
//!
//! Late joiners receive the cached start of the current session (FLV header
//! and first tags) before live units.
//!
//! # Example
//! ```no_run
//! use flv_relay::{RelayServer, ServerConfig};
//!
//! # async fn example() -> flv_relay::error::Result<()> {
//! let relay = RelayServer::new(ServerConfig::default());
//! relay.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod hub;
pub mod media;
pub mod server;
pub mod session;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use hub::{HubConfig, LiveHub};
pub use server::{IngestServer, RelayServer, ServerConfig};
