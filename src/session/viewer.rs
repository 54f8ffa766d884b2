//! Viewer session
//!
//! Drives one HTTP-FLV viewer: subscribes to the hub, writes the preview
//! snapshot, then forwards live units until either side goes away.
//!
//! ```text
//!   LiveHub ──try_send──► Subscriber ──recv──► ViewerSession ──send──► body channel ──► HTTP
//! ```
//!
//! The body channel is small and bounded, so a client that stops reading
//! makes `send` wait; that wait is what the write timeout applies to.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::hub::{LiveHub, SubscriberId};
use crate::stats::ConnectionObserver;

/// Capacity of the channel between a viewer session and its HTTP body
pub const BODY_CHANNEL_CAPACITY: usize = 16;

/// Sending half of an HTTP response body
pub type BodySender = mpsc::Sender<io::Result<Bytes>>;

/// One viewer connection
pub struct ViewerSession {
    connection_id: String,
    hub: Arc<LiveHub>,
    observer: Arc<dyn ConnectionObserver>,
    body: BodySender,
    write_timeout: Duration,
    subscriber_id: Option<SubscriberId>,
    bytes_sent: u64,
}

impl ViewerSession {
    pub fn new(
        connection_id: impl Into<String>,
        hub: Arc<LiveHub>,
        observer: Arc<dyn ConnectionObserver>,
        body: BodySender,
        write_timeout: Duration,
    ) -> Self {
        let connection_id = connection_id.into();
        observer.on_connection_opened(&connection_id);

        Self {
            connection_id,
            hub,
            observer,
            body,
            write_timeout,
            subscriber_id: None,
            bytes_sent: 0,
        }
    }

    /// Stream until the client disconnects or the subscription ends.
    ///
    /// A client going away is a normal end and returns `Ok`; a write that
    /// exceeds the write timeout returns an I/O error.
    pub async fn run(mut self) -> Result<()> {
        let (snapshot, mut subscriber) = self.hub.subscribe();
        self.subscriber_id = Some(subscriber.id());

        if !snapshot.is_empty() && !self.write(snapshot).await? {
            return Ok(());
        }

        loop {
            let unit = tokio::select! {
                unit = subscriber.recv() => unit,
                _ = self.body.closed() => None,
            };

            match unit {
                Some(unit) if unit.is_empty() => continue,
                Some(unit) => {
                    if !self.write(unit).await? {
                        return Ok(());
                    }
                }
                None => return Ok(()),
            }
        }
    }

    /// Hand one chunk to the HTTP body.
    ///
    /// Returns `false` once the client is gone.
    async fn write(&mut self, data: Bytes) -> Result<bool> {
        let len = data.len();

        let sent = if self.write_timeout.is_zero() {
            self.body.send(Ok(data)).await.is_ok()
        } else {
            match tokio::time::timeout(self.write_timeout, self.body.send(Ok(data))).await {
                Ok(result) => result.is_ok(),
                Err(_) => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "viewer write timed out",
                    )))
                }
            }
        };

        if sent {
            self.bytes_sent += len as u64;
            self.observer.on_bytes(&self.connection_id, len);
        }
        Ok(sent)
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        if let Some(id) = self.subscriber_id.take() {
            self.hub.unsubscribe(id);
        }
        self.observer.on_connection_closed(&self.connection_id);

        tracing::info!(
            viewer = %self.connection_id,
            bytes = self.bytes_sent,
            "Viewer disconnected"
        );
    }
}
