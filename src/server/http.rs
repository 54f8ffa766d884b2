//! HTTP surface
//!
//! Routes:
//! - `GET /live.flv` - live FLV stream (preview snapshot, then live tags)
//! - `GET /status` - JSON connection table

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::Result;
use crate::hub::LiveHub;
use crate::session::{ViewerSession, BODY_CHANNEL_CAPACITY};
use crate::stats::StatusRegistry;

/// MIME type of the live stream
pub const FLV_CONTENT_TYPE: &str = "video/x-flv";

/// Shared handler state
#[derive(Clone)]
pub struct HttpState {
    hub: Arc<LiveHub>,
    status: Arc<StatusRegistry>,
    write_timeout: Duration,
}

impl HttpState {
    pub fn new(hub: Arc<LiveHub>, status: Arc<StatusRegistry>, write_timeout: Duration) -> Self {
        Self {
            hub,
            status,
            write_timeout,
        }
    }
}

/// Build the axum router
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/live.flv", get(live_flv))
        .route("/status", get(status))
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: HttpState, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    // Connect info gives each viewer a status identity
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Handle a live stream request
async fn live_flv(
    State(state): State<HttpState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> std::result::Result<Response, StatusCode> {
    tracing::info!(peer = %peer, "New HTTP preview client");

    // Bounded so a client that stops reading stalls only its own session
    let (tx, rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);

    let session = ViewerSession::new(
        format!("viewer:{}", peer),
        Arc::clone(&state.hub),
        state.status.clone(),
        tx,
        state.write_timeout,
    );

    tokio::spawn(async move {
        if let Err(e) = session.run().await {
            tracing::warn!(peer = %peer, error = %e, "Viewer session error");
        }
    });

    let body = Body::from_stream(ReceiverStream::new(rx));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, FLV_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-store")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_response())
}

/// Handle a status request
async fn status(State(state): State<HttpState>) -> std::result::Result<Response, StatusCode> {
    let json = state.status.to_json().map_err(|e| {
        tracing::error!(error = %e, "Failed to encode status");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}
