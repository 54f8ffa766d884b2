//! Per-session hub state
//!
//! There is one session at a time: it starts with the first broadcast after
//! the previous one ended, and its preview cache stays available until the
//! next session replaces it.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;

use super::subscriber::SubscriberId;

/// Mutable hub state, only touched under the hub lock
pub(super) struct SessionState {
    /// Whether a publisher is currently sending
    pub live: bool,

    /// First bytes of the current (or last) session
    pub cache: BytesMut,

    /// Registered viewer queues
    pub subscribers: HashMap<SubscriberId, mpsc::Sender<Bytes>>,

    /// Next subscriber ID to allocate
    pub next_id: u64,

    /// Sessions started since the hub was created
    pub sessions: u64,

    /// Units dropped because a viewer queue was full
    pub dropped: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            live: false,
            cache: BytesMut::new(),
            subscribers: HashMap::new(),
            next_id: 1,
            sessions: 0,
            dropped: 0,
        }
    }

    /// Append to the preview cache without exceeding `limit`.
    ///
    /// Returns the number of bytes cached.
    pub fn append_cache(&mut self, data: &[u8], limit: usize) -> usize {
        let room = limit.saturating_sub(self.cache.len());
        let n = room.min(data.len());
        self.cache.extend_from_slice(&data[..n]);
        n
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            live: self.live,
            cache_bytes: self.cache.len(),
            subscribers: self.subscribers.len(),
            sessions: self.sessions,
            dropped_units: self.dropped,
        }
    }
}

/// Point-in-time hub statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStats {
    /// Whether a session is in progress
    pub live: bool,
    /// Bytes in the preview cache
    pub cache_bytes: usize,
    /// Registered subscribers
    pub subscribers: usize,
    /// Sessions started so far
    pub sessions: u64,
    /// Units dropped for slow viewers
    pub dropped_units: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_cache_bounded() {
        let mut state = SessionState::new();

        assert_eq!(state.append_cache(&[1; 6], 10), 6);
        assert_eq!(state.append_cache(&[2; 6], 10), 4);
        assert_eq!(state.append_cache(&[3; 6], 10), 0);
        assert_eq!(state.cache.len(), 10);
        assert_eq!(&state.cache[..], &[1, 1, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_initial_stats() {
        let state = SessionState::new();
        let stats = state.stats();

        assert!(!stats.live);
        assert_eq!(stats.cache_bytes, 0);
        assert_eq!(stats.subscribers, 0);
        assert_eq!(stats.sessions, 0);
        assert_eq!(stats.dropped_units, 0);
    }
}
