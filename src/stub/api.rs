use crate::access::profile::ProfilePayload;
use crate::telemetry::record::{LogLevel, LogRecord};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Shared state for the ingestion stub.
#[derive(Default)]
pub struct StubState {
    stats: Mutex<StubStats>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StubStats {
    pub batches: u64,
    pub records: u64,
    pub errors: u64,
    pub warnings: u64,
    pub profiles: u64,
}

impl StubState {
    pub fn stats(&self) -> StubStats {
        *self.stats.lock().unwrap()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub accepted: usize,
}

/// POST /api/log-event: accept a batch of telemetry records
pub async fn ingest_logs(
    State(state): State<Arc<StubState>>,
    Json(batch): Json<Vec<LogRecord>>,
) -> Json<IngestResponse> {
    let errors = batch
        .iter()
        .filter(|r| r.level == LogLevel::Error)
        .count() as u64;
    let warnings = batch
        .iter()
        .filter(|r| r.level == LogLevel::Warning)
        .count() as u64;

    {
        let mut stats = state.stats.lock().unwrap();
        stats.batches += 1;
        stats.records += batch.len() as u64;
        stats.errors += errors;
        stats.warnings += warnings;
    }

    info!(
        records = batch.len(),
        errors, warnings, "Received log batch"
    );

    Json(IngestResponse {
        accepted: batch.len(),
    })
}

/// POST /api/profile: accept a profile sync payload
pub async fn sync_profile(
    State(state): State<Arc<StubState>>,
    Json(payload): Json<ProfilePayload>,
) -> StatusCode {
    state.stats.lock().unwrap().profiles += 1;
    info!(sub = %payload.sub, "Received profile sync");
    StatusCode::OK
}

/// GET /api/stats: ingestion counters for tests and smoke checks
pub async fn get_stats(State(state): State<Arc<StubState>>) -> Json<StubStats> {
    Json(state.stats())
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
