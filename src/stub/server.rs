use crate::stub::api::{get_stats, health_check, ingest_logs, sync_profile, StubState};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Start the development ingestion stub, a stand-in for the remote
/// log-ingestion and profile backends.
pub async fn start_server(
    listen_addr: SocketAddr,
    state: Arc<StubState>,
) -> Result<(), std::io::Error> {
    let app = Router::new()
        .route("/api/log-event", post(ingest_logs))
        .route("/api/profile", post(sync_profile))
        .route("/api/stats", get(get_stats))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %listen_addr, "Starting ingestion stub");

    let listener = TcpListener::bind(listen_addr).await?;
    axum::serve(listener, app).await
}
