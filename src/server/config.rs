//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::hub::HubConfig;

/// Default ingest read chunk size
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;

/// Server configuration options
///
/// This is the settings structure handed to the ingest and viewer sides;
/// file parsing lives in [`crate::config`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the raw TCP ingest listener binds to
    pub ingest_addr: SocketAddr,

    /// Address the HTTP viewer/status server binds to
    pub http_addr: SocketAddr,

    /// Ingest read deadline (zero = none)
    pub read_timeout: Duration,

    /// Viewer write deadline (zero = none)
    pub write_timeout: Duration,

    /// Recording output buffer size (0 = unbuffered)
    pub write_buffer_size: usize,

    /// Ingest read chunk size
    pub read_buffer_size: usize,

    /// Directory recordings are written to (None = recording disabled)
    pub record_dir: Option<PathBuf>,

    /// Enable TCP_NODELAY on ingest sockets
    pub tcp_nodelay: bool,

    /// Live hub settings
    pub hub: HubConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ingest_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            read_timeout: Duration::ZERO,
            write_timeout: Duration::ZERO,
            write_buffer_size: 0,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            record_dir: Some(PathBuf::from(".")),
            tcp_nodelay: true,
            hub: HubConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Set the ingest bind address
    pub fn ingest_addr(mut self, addr: SocketAddr) -> Self {
        self.ingest_addr = addr;
        self
    }

    /// Set the HTTP bind address
    pub fn http_addr(mut self, addr: SocketAddr) -> Self {
        self.http_addr = addr;
        self
    }

    /// Set the ingest read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the viewer write timeout
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the recording output buffer size
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Set the recording directory
    pub fn record_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.record_dir = Some(dir.into());
        self
    }

    /// Disable recording to disk
    pub fn disable_recording(mut self) -> Self {
        self.record_dir = None;
        self
    }

    /// Set the hub configuration
    pub fn hub(mut self, hub: HubConfig) -> Self {
        self.hub = hub;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.ingest_addr.port(), 9000);
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.read_timeout, Duration::ZERO);
        assert_eq!(config.write_buffer_size, 0);
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.record_dir, Some(PathBuf::from(".")));
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_builder_disable_recording() {
        let config = ServerConfig::default().disable_recording();

        assert!(config.record_dir.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let ingest: SocketAddr = "127.0.0.1:1936".parse().unwrap();
        let http: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let config = ServerConfig::default()
            .ingest_addr(ingest)
            .http_addr(http)
            .read_timeout(Duration::from_millis(5000))
            .write_timeout(Duration::from_millis(3000))
            .write_buffer_size(65536)
            .record_dir("/tmp/rec")
            .hub(HubConfig::default().subscriber_capacity(16));

        assert_eq!(config.ingest_addr, ingest);
        assert_eq!(config.http_addr, http);
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
        assert_eq!(config.write_buffer_size, 65536);
        assert_eq!(config.record_dir, Some(PathBuf::from("/tmp/rec")));
        assert_eq!(config.hub.subscriber_capacity, 16);
    }
}
