//! Live broadcast hub
//!
//! The hub fans every unit from the current ingest session out to all
//! connected viewers, and keeps the first bytes of the session so that late
//! joiners can start from the stream header.
//!
//! # Architecture
//!
//! ```text
//!                            Arc<LiveHub>
//!                     ┌─────────────────────────┐
//!                     │ Mutex<SessionState {    │
//!                     │   live,                 │
//!                     │   cache: BytesMut,      │
//!                     │   subscribers: Map<Id,  │
//!                     │     mpsc::Sender>,      │
//!                     │ }>                      │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!   [Ingest session]         [Viewer]                [Viewer]
//!   framer callback          rx.recv()               rx.recv()
//!         │                       │                       │
//!         └──► hub.broadcast() ──► try_send() ──► HTTP body
//! ```
//!
//! # Backpressure
//!
//! Each viewer has a bounded queue. Delivery is a single `try_send`: when a
//! queue is full the unit is dropped for that viewer only, so a slow viewer
//! never stalls ingest or other viewers.
//!
//! # Zero-Copy Design
//!
//! Units are `bytes::Bytes`; every queue receives a reference-counted handle
//! to the same allocation.

pub mod config;
pub mod session;
pub mod store;
pub mod subscriber;

pub use config::HubConfig;
pub use session::HubStats;
pub use store::LiveHub;
pub use subscriber::{Subscriber, SubscriberId};
