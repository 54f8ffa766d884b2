//! Session context
//!
//! Identity and lifecycle information for one ingest connection.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Ingest session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, FLV header not seen yet
    WaitingHeader,
    /// Header emitted, tags flowing
    Streaming,
    /// Torn down
    Closed,
}

/// Identity of an ingest connection
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique session ID
    pub session_id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Connection start time
    pub connected_at: Instant,
}

impl SessionContext {
    /// Create a new context
    pub fn new(session_id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            session_id,
            peer_addr,
            connected_at: Instant::now(),
        }
    }

    /// Key used for status reporting
    pub fn connection_id(&self) -> String {
        self.peer_addr.to_string()
    }

    /// Recording file name, derived from the peer address
    pub fn recording_file_name(&self) -> String {
        format!("stream_{}.flv", sanitize_file_name(&self.connection_id()))
    }

    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Replace path separators and `:` so the result is a single file name
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ':' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}
