//! Ingest listener
//!
//! Handles the TCP accept loop and spawns one ingest session per publisher.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::hub::LiveHub;
use crate::server::config::ServerConfig;
use crate::session::{IngestSession, SessionContext};
use crate::stats::ConnectionObserver;

/// Raw TCP ingest server
pub struct IngestServer {
    config: ServerConfig,
    hub: Arc<LiveHub>,
    observer: Arc<dyn ConnectionObserver>,
    next_session_id: AtomicU64,
}

impl IngestServer {
    /// Create a new ingest server feeding `hub`
    pub fn new(config: ServerConfig, hub: Arc<LiveHub>, observer: Arc<dyn ConnectionObserver>) -> Self {
        Self {
            config,
            hub,
            observer,
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Get a reference to the hub
    pub fn hub(&self) -> &Arc<LiveHub> {
        &self.hub
    }

    /// Run the server
    ///
    /// Only returns if the ingest address cannot be bound.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = self.bind().await?;
        self.serve_until(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    /// Bind the configured ingest address
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.config.ingest_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "TCP ingest listening");
        Ok(listener)
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, mut socket: TcpStream, peer_addr: SocketAddr) {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::info!(
            session_id = session_id,
            peer = %peer_addr,
            "New ingest connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let ctx = SessionContext::new(session_id, peer_addr);
        let mut session = match IngestSession::new(
            ctx,
            Arc::clone(&self.hub),
            Arc::clone(&self.observer),
            &self.config,
        ) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(session_id = session_id, error = %e, "Failed to start ingest session");
                return;
            }
        };

        tokio::spawn(async move {
            if let Err(e) = session.run(&mut socket).await {
                tracing::warn!(
                    session_id = session_id,
                    peer = %peer_addr,
                    error = %e,
                    "Ingest session error"
                );
            }
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }
}
