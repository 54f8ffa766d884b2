//! Subscriber handles
//!
//! A subscriber is the receiving end of one viewer's bounded queue. The hub
//! keeps the sending end in its registry; dropping it (on unsubscribe) ends
//! the stream once the queue has been drained.

use bytes::Bytes;
use tokio::sync::mpsc;

/// Registry key for a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub(crate) u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Receiving end of a viewer's live queue
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    rx: mpsc::Receiver<Bytes>,
}

impl Subscriber {
    pub(super) fn new(id: SubscriberId, rx: mpsc::Receiver<Bytes>) -> Self {
        Self { id, rx }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next unit.
    ///
    /// Returns `None` once the hub has unsubscribed this viewer and every
    /// queued unit has been received.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Take a queued unit without waiting
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}
