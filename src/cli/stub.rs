use crate::config::load_config;
use crate::config::types::StubConfig;
use crate::stub::{start_server, StubState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Start the local development ingestion stub. Config is optional here:
/// with no config file the stub falls back to the default listen address.
pub async fn serve(
    config_path: Option<PathBuf>,
    listen_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listen = match listen_override {
        Some(listen) => listen,
        None => match config_path {
            Some(path) => load_config(&path)?.stub.listen,
            None => {
                let default = StubConfig::default().listen;
                warn!(listen = %default, "No config found, using default listen address");
                default
            }
        },
    };

    let listen_addr: std::net::SocketAddr = listen
        .parse()
        .map_err(|e| format!("invalid listen address '{}': {}", listen, e))?;

    let state = Arc::new(StubState::default());
    start_server(listen_addr, state).await?;

    Ok(())
}
