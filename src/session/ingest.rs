//! Ingest session
//!
//! Reads one publisher connection, frames it, and writes every unit to the
//! recording and then the hub:
//!
//! ```text
//!   TcpStream ──read──► TagFramer ──► MultiSink ─┬─► FileSink (stream_<peer>.flv)
//!                                                └─► HubSink ──► LiveHub::broadcast
//! ```
//!
//! Teardown closes the framer and the sinks and ends the hub session exactly
//! once, whether the read loop finished normally, failed, or the task was
//! dropped mid-way.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::hub::LiveHub;
use crate::media::framer::TagFramer;
use crate::server::config::{ServerConfig, DEFAULT_READ_BUFFER_SIZE};
use crate::stats::ConnectionObserver;
use crate::storage::{FileSink, HubSink, MultiSink, Sink};

use super::context::{SessionContext, SessionPhase};

/// One ingest connection's framer and sinks
pub struct IngestSession {
    ctx: SessionContext,
    connection_id: String,
    framer: TagFramer<MultiSink>,
    hub: Arc<LiveHub>,
    observer: Arc<dyn ConnectionObserver>,
    read_buffer_size: usize,
    read_timeout: Duration,
    phase: SessionPhase,
    bytes_received: u64,
}

impl IngestSession {
    /// Open the recording and register the connection.
    ///
    /// Fails with [`Error::Sink`] if the recording file cannot be created.
    pub fn new(
        ctx: SessionContext,
        hub: Arc<LiveHub>,
        observer: Arc<dyn ConnectionObserver>,
        config: &ServerConfig,
    ) -> Result<Self> {
        let recording: Option<Box<dyn Sink + Send>> = match config.record_dir {
            Some(ref dir) => {
                let path = dir.join(ctx.recording_file_name());
                let sink: Box<dyn Sink + Send> = Box::new(
                    FileSink::create(&path, config.write_buffer_size).map_err(Error::Sink)?,
                );
                tracing::info!(
                    session_id = ctx.session_id,
                    path = %path.display(),
                    "Recording ingest session"
                );
                Some(sink)
            }
            None => None,
        };

        Ok(Self::with_recording(ctx, hub, observer, config, recording))
    }

    /// Build a session around an already opened recording target
    /// (`None` = not recorded).
    pub fn with_recording(
        ctx: SessionContext,
        hub: Arc<LiveHub>,
        observer: Arc<dyn ConnectionObserver>,
        config: &ServerConfig,
        recording: Option<Box<dyn Sink + Send>>,
    ) -> Self {
        let broadcast: Box<dyn Sink + Send> = Box::new(HubSink::new(Arc::clone(&hub)));
        let sinks = MultiSink::new(vec![recording, Some(broadcast)]);

        let connection_id = ctx.connection_id();
        observer.on_connection_opened(&connection_id);

        let read_buffer_size = if config.read_buffer_size == 0 {
            DEFAULT_READ_BUFFER_SIZE
        } else {
            config.read_buffer_size
        };

        Self {
            ctx,
            connection_id,
            framer: TagFramer::new(sinks),
            hub,
            observer,
            read_buffer_size,
            read_timeout: config.read_timeout,
            phase: SessionPhase::WaitingHeader,
            bytes_received: 0,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Read the connection until it ends, then tear the session down.
    ///
    /// A clean end of input returns `Ok`. Transport errors, malformed input
    /// and sink failures are returned after teardown.
    pub async fn run<R>(&mut self, reader: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let result = self.read_loop(reader).await;
        self.finish();
        result
    }

    async fn read_loop<R>(&mut self, reader: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; self.read_buffer_size];

        loop {
            let n = read_chunk(self.read_timeout, reader, &mut buf).await?;
            if n == 0 {
                tracing::debug!(session_id = self.ctx.session_id, "Ingest stream ended");
                return Ok(());
            }

            self.bytes_received += n as u64;
            self.observer.on_bytes(&self.connection_id, n);

            match self.framer.feed(&buf[..n]) {
                Ok(()) => {}
                Err(e) if e.is_closed() => return Ok(()),
                Err(e) => return Err(e),
            }

            if self.phase == SessionPhase::WaitingHeader && self.framer.is_header_emitted() {
                self.phase = SessionPhase::Streaming;
            }
        }
    }

    /// Close the framer and sinks and end the hub session.
    ///
    /// Only the first call has any effect.
    pub fn finish(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.phase = SessionPhase::Closed;

        self.framer.close();
        if let Err(e) = self.framer.handler_mut().close() {
            tracing::warn!(
                session_id = self.ctx.session_id,
                error = %e,
                "Failed to close recording"
            );
        }
        self.hub.end_session();
        self.observer.on_connection_closed(&self.connection_id);

        tracing::info!(
            session_id = self.ctx.session_id,
            peer = %self.ctx.peer_addr,
            bytes = self.bytes_received,
            duration_ms = self.ctx.duration().as_millis() as u64,
            "Ingest session closed"
        );
    }
}

impl Drop for IngestSession {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Read one chunk, failing with `TimedOut` if `read_timeout` (non-zero) expires
async fn read_chunk<R>(read_timeout: Duration, reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    if read_timeout.is_zero() {
        return Ok(reader.read(buf).await?);
    }

    match tokio::time::timeout(read_timeout, reader.read(buf)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::Io(io::Error::new(
            io::ErrorKind::TimedOut,
            "ingest read timed out",
        ))),
    }
}
