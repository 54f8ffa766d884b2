//! Persistence sinks
//!
//! A sink accepts raw bytes and reports failure; nothing more is promised
//! than what the underlying storage gives. [`MultiSink`] writes the same
//! bytes to several sinks in order, which is how an ingest session records
//! to disk and broadcasts through one callback.

pub mod file;
pub mod multi;

use std::io;
use std::sync::Arc;

use bytes::Bytes;

use crate::hub::LiveHub;

pub use file::FileSink;
pub use multi::MultiSink;

/// Destination for raw stream bytes
pub trait Sink {
    /// Write one unit
    fn write(&mut self, data: &Bytes) -> io::Result<()>;

    /// Release the underlying resource. Writes after close are ignored.
    fn close(&mut self) -> io::Result<()>;
}

/// In-memory capture
impl Sink for Vec<u8> {
    fn write(&mut self, data: &Bytes) -> io::Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Forwards writes to [`LiveHub::broadcast`]
///
/// Closing does not end the hub session; the ingest session owns that.
pub struct HubSink {
    hub: Arc<LiveHub>,
}

impl HubSink {
    pub fn new(hub: Arc<LiveHub>) -> Self {
        Self { hub }
    }
}

impl Sink for HubSink {
    fn write(&mut self, data: &Bytes) -> io::Result<()> {
        self.hub.broadcast(data.clone());
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<u8> = Vec::new();
        Sink::write(&mut sink, &Bytes::from_static(b"abc")).unwrap();
        Sink::write(&mut sink, &Bytes::from_static(b"de")).unwrap();
        assert_eq!(sink, b"abcde");
    }

    #[tokio::test]
    async fn test_hub_sink_broadcasts() {
        let hub = Arc::new(LiveHub::new());
        let (_, mut sub) = hub.subscribe();

        let mut sink = HubSink::new(Arc::clone(&hub));
        sink.write(&Bytes::from_static(b"tag")).unwrap();
        sink.close().unwrap();

        assert_eq!(sub.recv().await.unwrap(), Bytes::from_static(b"tag"));
        // Closing the sink leaves the session running
        assert!(hub.is_live());
    }
}
