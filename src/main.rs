//! flv-relay server binary
//!
//! Run with: flv-relay [--config configs/prod.yaml]
//!
//! Publishing:
//!   ffmpeg -re -i input.mp4 -c copy -f flv tcp://localhost:9000
//!
//! Playing:
//!   ffplay http://localhost:8080/live.flv

use std::path::PathBuf;

use clap::Parser;
use flv_relay::{Config, RelayServer};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flv-relay")]
#[command(about = "Live FLV ingest, recording and HTTP-FLV relay", long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, short, env = "FLV_RELAY_CONFIG", default_value = "configs/prod.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server_config = config.server_config().await?;
    tracing::info!(
        config = %args.config.display(),
        ingest = %server_config.ingest_addr,
        http = %server_config.http_addr,
        recording = server_config.record_dir.is_some(),
        "Starting flv-relay"
    );

    let relay = RelayServer::new(server_config);
    relay
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}
