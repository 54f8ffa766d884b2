//! Relay server
//!
//! Two listeners share one [`LiveHub`](crate::hub::LiveHub) and one status
//! table:
//!
//! ```text
//!   publisher ──TCP──► IngestServer ──► LiveHub ◄── /live.flv ◄──HTTP── viewers
//!                          │                           │
//!                          └──────► StatusRegistry ◄───┘──► /status
//! ```

pub mod config;
pub mod http;
pub mod listener;
pub mod relay;

pub use config::ServerConfig;
pub use http::{build_router, HttpState};
pub use listener::IngestServer;
pub use relay::RelayServer;
