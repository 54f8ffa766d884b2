//! Configuration file
//!
//! YAML layout:
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 9000
//! tcp:
//!   read_timeout_ms: 0
//!   write_timeout_ms: 0
//! flv:
//!   write_buffer: 0
//! log:
//!   level: info
//! http:
//!   host: 0.0.0.0
//!   port: 8080
//! storage:
//!   dir: .
//!   record: true
//! ```
//!
//! Every field has a default, so a partial (or empty) file is valid.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::server::ServerConfig;

/// Ingest listener section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
        }
    }
}

/// Transport deadlines in milliseconds (0 = none)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpSection {
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

/// Recording output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlvSection {
    /// Output buffer size hint for recordings (0 = unbuffered)
    pub write_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// `tracing` filter directive, e.g. `info` or `flv_relay=debug`
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Viewer/status HTTP server section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub host: String,
    pub port: u16,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Directory recordings are written to
    pub dir: PathBuf,
    /// Whether ingest sessions are recorded at all
    pub record: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            record: true,
        }
    }
}

/// Full configuration loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub tcp: TcpSection,
    pub flv: FlvSection,
    pub log: LogSection,
    pub http: HttpSection,
    pub storage: StorageSection,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("open {}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("decode: {}", e)))
    }

    /// Build the runtime server settings, resolving host names
    pub async fn server_config(&self) -> Result<ServerConfig> {
        let ingest_addr = socket_addr(&self.server.host, self.server.port).await?;
        let http_addr = socket_addr(&self.http.host, self.http.port).await?;

        let mut config = ServerConfig::default()
            .ingest_addr(ingest_addr)
            .http_addr(http_addr)
            .read_timeout(Duration::from_millis(self.tcp.read_timeout_ms))
            .write_timeout(Duration::from_millis(self.tcp.write_timeout_ms))
            .write_buffer_size(self.flv.write_buffer);

        config = if self.storage.record {
            config.record_dir(self.storage.dir.clone())
        } else {
            config.disable_recording()
        };

        Ok(config)
    }
}

/// Resolve `host` to the first address it names
async fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    // An empty host means all interfaces, as with ":9000"
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| Error::Config(format!("resolve host {}: {}", host, e)))?;
    addrs
        .next()
        .ok_or_else(|| Error::Config(format!("host {} has no addresses", host)))
}
