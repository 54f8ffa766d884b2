//! Relay runner: ingest listener plus HTTP server over one hub

use std::sync::Arc;

use futures::FutureExt;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::hub::LiveHub;
use crate::stats::StatusRegistry;

use super::config::ServerConfig;
use super::http::{self, HttpState};
use super::listener::IngestServer;

/// Complete relay: ingest, recording, fan-out, viewers and status
pub struct RelayServer {
    config: ServerConfig,
    hub: Arc<LiveHub>,
    status: Arc<StatusRegistry>,
}

impl RelayServer {
    pub fn new(config: ServerConfig) -> Self {
        let hub = Arc::new(LiveHub::with_config(config.hub.clone()));
        Self {
            config,
            hub,
            status: Arc::new(StatusRegistry::new()),
        }
    }

    pub fn hub(&self) -> &Arc<LiveHub> {
        &self.hub
    }

    pub fn status(&self) -> &Arc<StatusRegistry> {
        &self.status
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Create the recording directory, bind the configured addresses and
    /// serve until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        if let Some(ref dir) = self.config.record_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        let ingest = TcpListener::bind(self.config.ingest_addr).await?;
        let http = TcpListener::bind(self.config.http_addr).await?;
        self.serve_until(ingest, http, shutdown).await
    }

    /// Serve on already bound listeners until `shutdown` resolves.
    ///
    /// Either listener failing stops both.
    pub async fn serve_until<F>(
        &self,
        ingest_listener: TcpListener,
        http_listener: TcpListener,
        shutdown: F,
    ) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = shutdown.shared();

        let ingest = IngestServer::new(
            self.config.clone(),
            Arc::clone(&self.hub),
            self.status.clone(),
        );
        tracing::info!(addr = %ingest_listener.local_addr()?, "TCP ingest listening");

        let state = HttpState::new(
            Arc::clone(&self.hub),
            Arc::clone(&self.status),
            self.config.write_timeout,
        );

        tokio::try_join!(
            ingest.serve_until(ingest_listener, shutdown.clone()),
            http::serve(http_listener, state, shutdown),
        )?;

        tracing::info!("Relay stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use super::*;
    use crate::media::flv::{encode_header, encode_tag, FlvTagType};

    #[tokio::test]
    async fn test_shutdown_stops_both_listeners() {
        let relay = RelayServer::new(ServerConfig::default().disable_recording());
        let ingest = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let http = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let shutdown = async move {
            let _ = rx.await;
        };

        tx.send(()).unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            relay.serve_until(ingest, http, shutdown),
        )
        .await
        .unwrap()
        .unwrap();
    }

    #[tokio::test]
    async fn test_status_lists_publisher() {
        let relay = Arc::new(RelayServer::new(ServerConfig::default().disable_recording()));
        let ingest = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let http = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ingest_addr = ingest.local_addr().unwrap();
        let http_addr = http.local_addr().unwrap();

        let (tx, rx) = oneshot::channel::<()>();
        let server = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move {
                relay
                    .serve_until(ingest, http, async move {
                        let _ = rx.await;
                    })
                    .await
            })
        };

        let mut publisher = TcpStream::connect(ingest_addr).await.unwrap();
        let local = publisher.local_addr().unwrap().to_string();
        publisher.write_all(&encode_header(false, true)).await.unwrap();
        publisher
            .write_all(&encode_tag(FlvTagType::Video, 0, &[0x17, 0]))
            .await
            .unwrap();

        while relay.status().bytes(&local) != Some(13 + 17) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(relay.hub().is_live());

        // Plain HTTP/1.0 request; the server closes after the response
        let mut client = TcpStream::connect(http_addr).await.unwrap();
        client
            .write_all(b"GET /status HTTP/1.0\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        assert!(response.contains(" 200 OK"));
        assert!(response.contains(&format!("\"{}\": 30", local)));

        drop(publisher);
        while relay.hub().is_live() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
