//! Connection statistics

pub mod status;

pub use status::{ConnectionObserver, NoopObserver, StatusRegistry, StatusReport};
