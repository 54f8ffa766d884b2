//! Connection status tracking
//!
//! Sessions report their lifecycle to an injected [`ConnectionObserver`];
//! [`StatusRegistry`] is the implementation behind the `/status` endpoint.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::Serialize;

/// Receives connection lifecycle events from ingest and viewer sessions
pub trait ConnectionObserver: Send + Sync {
    fn on_connection_opened(&self, id: &str);

    /// `n` more bytes moved over connection `id`
    fn on_bytes(&self, id: &str, n: usize);

    fn on_connection_closed(&self, id: &str);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ConnectionObserver for NoopObserver {
    fn on_connection_opened(&self, _id: &str) {}
    fn on_bytes(&self, _id: &str, _n: usize) {}
    fn on_connection_closed(&self, _id: &str) {}
}

/// Serializable snapshot of the live connections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Cumulative bytes per open connection
    pub connections: BTreeMap<String, u64>,
}

/// Tracks live connections and their cumulative byte counts
#[derive(Debug)]
pub struct StatusRegistry {
    connections: Mutex<BTreeMap<String, u64>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(BTreeMap::new()),
        }
    }

    /// Copy of the current connection table
    pub fn report(&self) -> StatusReport {
        StatusReport {
            connections: self.connections.lock().clone(),
        }
    }

    /// Report as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.report())
    }

    /// Bytes counted so far for `id`, if it is open
    pub fn bytes(&self, id: &str) -> Option<u64> {
        self.connections.lock().get(id).copied()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionObserver for StatusRegistry {
    fn on_connection_opened(&self, id: &str) {
        self.connections.lock().insert(id.to_string(), 0);
    }

    fn on_bytes(&self, id: &str, n: usize) {
        // Late byte reports for a closed connection are ignored
        if let Some(count) = self.connections.lock().get_mut(id) {
            *count += n as u64;
        }
    }

    fn on_connection_closed(&self, id: &str) {
        self.connections.lock().remove(id);
    }
}
