//! Health and Metrics Routes

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::SharedState;

/// Store status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub backend: String,
    pub database: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub collections: CollectionCounts,
}

/// Document counts per collection
#[derive(Debug, Serialize)]
pub struct CollectionCounts {
    pub user: usize,
    pub session: usize,
    pub report: usize,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "SheSecure backend is running" }))
}

/// Backend and store status
pub async fn test_database(State(state): State<SharedState>) -> Json<StatusResponse> {
    let state = state.read().await;
    Json(StatusResponse {
        backend: "✅ Running".to_string(),
        database: "✅ Connected (in-memory)".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        collections: CollectionCounts {
            user: state.repository.user_count(),
            session: state.repository.session_count(),
            report: state.repository.report_count(),
        },
    })
}

/// Prometheus exposition
pub async fn metrics(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
