//! Live hub implementation
//!
//! The single shared structure reached from every ingest and viewer task.

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::config::HubConfig;
use super::session::{HubStats, SessionState};
use super::subscriber::{Subscriber, SubscriberId};

/// One-to-many live fan-out with a bounded preview cache
///
/// All mutation happens under one lock that is never held across I/O or an
/// `.await`; broadcasting only ever does non-blocking sends.
pub struct LiveHub {
    state: Mutex<SessionState>,

    /// Configuration
    config: HubConfig,
}

impl LiveHub {
    /// Create a hub with default configuration
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a hub with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            state: Mutex::new(SessionState::new()),
            config,
        }
    }

    /// Get the hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Push a unit to every subscriber and the preview cache
    ///
    /// The first broadcast after [`end_session`](Self::end_session) (or on a
    /// fresh hub) starts a new session and clears the previous cache. Bytes
    /// past the cache ceiling are still delivered live.
    pub fn broadcast(&self, data: Bytes) {
        let mut state = self.state.lock();

        if !state.live {
            state.cache.clear();
            state.live = true;
            state.sessions += 1;
            tracing::info!(session = state.sessions, "New live session, cache reset");
        }

        let limit = self.config.preview_cache_limit;
        state.append_cache(&data, limit);

        let mut dropped = 0;
        state.subscribers.retain(|id, tx| match tx.try_send(data.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                tracing::debug!(subscriber = %id, size = data.len(), "Subscriber queue full, dropping unit");
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(subscriber = %id, "Subscriber gone, removing");
                false
            }
        });
        state.dropped += dropped;
    }

    /// Mark the current session as ended
    ///
    /// The cache is kept so viewers joining between sessions still get the
    /// last session's beginning.
    pub fn end_session(&self) {
        let mut state = self.state.lock();
        state.live = false;

        tracing::info!(
            cache_bytes = state.cache.len(),
            subscribers = state.subscribers.len(),
            "Live session ended"
        );
    }

    /// Register a new subscriber
    ///
    /// Returns a copy of the preview cache, taken at the same instant the
    /// subscriber was registered, and the subscriber's live queue. Every unit
    /// broadcast after this call is queued after the snapshot, with no gap
    /// or overlap between the two.
    pub fn subscribe(&self) -> (Bytes, Subscriber) {
        let (tx, rx) = mpsc::channel(self.config.subscriber_capacity);

        let mut state = self.state.lock();
        let id = SubscriberId(state.next_id);
        state.next_id += 1;
        state.subscribers.insert(id, tx);
        let snapshot = Bytes::copy_from_slice(&state.cache);
        let subscribers = state.subscribers.len();
        drop(state);

        tracing::info!(
            subscriber = %id,
            subscribers = subscribers,
            snapshot_bytes = snapshot.len(),
            "Subscriber added"
        );

        (snapshot, Subscriber::new(id, rx))
    }

    /// Remove a subscriber
    ///
    /// Drops the sending end of its queue, so the subscriber sees the end of
    /// the stream after draining what is already queued. Unknown or already
    /// removed IDs are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut state = self.state.lock();
        if state.subscribers.remove(&id).is_some() {
            tracing::debug!(
                subscriber = %id,
                subscribers = state.subscribers.len(),
                "Subscriber removed"
            );
        }
    }

    /// Whether a session is in progress
    pub fn is_live(&self) -> bool {
        self.state.lock().live
    }

    /// Current preview cache size in bytes
    pub fn cache_len(&self) -> usize {
        self.state.lock().cache.len()
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Get hub statistics
    pub fn stats(&self) -> HubStats {
        self.state.lock().stats()
    }
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;

    fn unit(byte: u8, len: usize) -> Bytes {
        Bytes::from(vec![byte; len])
    }

    #[tokio::test]
    async fn test_subscribe_receives_live_units() {
        let hub = LiveHub::new();

        let (snapshot, mut sub) = hub.subscribe();
        assert!(snapshot.is_empty());

        hub.broadcast(unit(1, 4));
        hub.broadcast(unit(2, 4));

        assert_eq!(sub.recv().await.unwrap(), unit(1, 4));
        assert_eq!(sub.recv().await.unwrap(), unit(2, 4));
    }

    #[tokio::test]
    async fn test_first_broadcast_starts_session() {
        let hub = LiveHub::new();
        assert!(!hub.is_live());

        hub.broadcast(unit(1, 3));
        assert!(hub.is_live());
        assert_eq!(hub.stats().sessions, 1);

        hub.end_session();
        assert!(!hub.is_live());
        // Cache survives the end of the session
        assert_eq!(hub.cache_len(), 3);
    }

    #[tokio::test]
    async fn test_late_joiner_snapshot_boundary() {
        let hub = LiveHub::new();
        hub.broadcast(unit(1, 5));
        hub.broadcast(unit(2, 5));

        let (snapshot, mut sub) = hub.subscribe();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(&snapshot[..5], &[1; 5]);
        assert_eq!(&snapshot[5..], &[2; 5]);

        hub.broadcast(unit(3, 5));
        assert_eq!(sub.recv().await.unwrap(), unit(3, 5));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_cache_ceiling() {
        let hub = LiveHub::with_config(HubConfig::default().preview_cache_limit(100));
        let (_snapshot, mut sub) = hub.subscribe();

        for i in 0..10u8 {
            hub.broadcast(unit(i, 30));
            assert!(hub.cache_len() <= 100);
        }
        assert_eq!(hub.cache_len(), 100);

        // Broadcast keeps working past the ceiling
        hub.broadcast(unit(0xFF, 30));
        assert_eq!(hub.cache_len(), 100);

        let mut received = 0;
        while sub.try_recv().is_some() {
            received += 1;
        }
        assert_eq!(received, 11);
    }

    #[tokio::test]
    async fn test_default_cache_ceiling() {
        let hub = LiveHub::new();
        let chunk = unit(7, 512 * 1024);

        for _ in 0..6 {
            hub.broadcast(chunk.clone());
        }
        assert_eq!(hub.cache_len(), 2 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_new_session_resets_cache() {
        let hub = LiveHub::new();
        hub.broadcast(unit(1, 8));
        hub.end_session();

        // Between sessions, joiners still see the old beginning
        let (snapshot, _sub) = hub.subscribe();
        assert_eq!(snapshot, unit(1, 8));

        hub.broadcast(unit(2, 4));
        let (snapshot, _sub) = hub.subscribe();
        assert_eq!(snapshot, unit(2, 4));
        assert!(!snapshot.contains(&1));
        assert_eq!(hub.stats().sessions, 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let hub = LiveHub::with_config(HubConfig::default().subscriber_capacity(2));
        let (_, mut slow) = hub.subscribe();
        let (_, mut fast) = hub.subscribe();

        let started = Instant::now();
        for i in 0..5u8 {
            hub.broadcast(unit(i, 1));
            // Fast viewer keeps up
            assert_eq!(fast.recv().await.unwrap(), unit(i, 1));
        }
        assert!(started.elapsed() < Duration::from_secs(1));

        // Slow viewer only got the first two; the rest were dropped
        assert_eq!(slow.try_recv().unwrap(), unit(0, 1));
        assert_eq!(slow.try_recv().unwrap(), unit(1, 1));
        assert!(slow.try_recv().is_none());

        assert_eq!(hub.stats().dropped_units, 3);
        // Still registered; a slow viewer is not disconnected
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_gaps_never_reorder() {
        let hub = LiveHub::with_config(HubConfig::default().subscriber_capacity(3));
        let (_, mut sub) = hub.subscribe();

        for i in 0..10u8 {
            hub.broadcast(unit(i, 1));
            if i % 4 == 0 {
                sub.try_recv();
            }
        }

        let mut last = None;
        while let Some(data) = sub.try_recv() {
            if let Some(prev) = last {
                assert!(data[0] > prev);
            }
            last = Some(data[0]);
        }
    }

    #[tokio::test]
    async fn test_unsubscribe_ends_stream() {
        let hub = LiveHub::new();
        let (_, mut sub) = hub.subscribe();

        hub.broadcast(unit(1, 2));
        hub.unsubscribe(sub.id());
        assert_eq!(hub.subscriber_count(), 0);

        // Queued data is still drained, then end of stream
        assert_eq!(sub.recv().await.unwrap(), unit(1, 2));
        assert!(sub.recv().await.is_none());

        // Idempotent
        hub.unsubscribe(sub.id());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let hub = LiveHub::new();
        let (_, sub) = hub.subscribe();
        drop(sub);

        hub.broadcast(unit(1, 1));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_broadcast_and_subscribe() {
        let hub = Arc::new(LiveHub::with_config(
            HubConfig::default().subscriber_capacity(256),
        ));

        let publisher = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for i in 0..200u32 {
                    hub.broadcast(Bytes::copy_from_slice(&i.to_be_bytes()));
                    tokio::task::yield_now().await;
                }
                hub.end_session();
            })
        };

        let (snapshot, mut sub) = hub.subscribe();
        publisher.await.unwrap();
        hub.unsubscribe(sub.id());

        // Snapshot and live units together form a contiguous sequence
        let mut all: Vec<u32> = snapshot
            .chunks(4)
            .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
            .collect();
        while let Some(data) = sub.recv().await {
            all.push(u32::from_be_bytes(data[..].try_into().unwrap()));
        }
        assert_eq!(all, (0..200).collect::<Vec<_>>());
    }
}
