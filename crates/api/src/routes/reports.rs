//! Unsafe-area Report Routes

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use storage::{NewReport, ReportRecord};

use crate::error::ApiError;
use crate::validation;
use crate::SharedState;

/// Report submission body
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub lat: f64,
    pub lng: f64,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default = "default_severity")]
    pub severity: i64,
    pub user_id: Option<String>,
}

fn default_severity() -> i64 {
    1
}

/// Store a report
pub async fn create_report(
    State(state): State<SharedState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<Value>, ApiError> {
    let severity = validation::severity(payload.severity)?;

    let state = state.read().await;
    let id = state.repository.insert_report(NewReport {
        lat: payload.lat,
        lng: payload.lng,
        description: payload.description,
        photo_url: payload.photo_url,
        severity,
        user_id: payload.user_id,
    })?;

    metrics::counter!("reports_created_total").increment(1);
    Ok(Json(json!({ "id": id })))
}

/// Newest reports first, up to the configured limit
///
/// `lat`, `lng` and `radius_km` query parameters are tolerated but no
/// spatial filtering is done.
pub async fn list_reports(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ReportRecord>>, ApiError> {
    let state = state.read().await;
    let reports = state
        .repository
        .recent_reports(state.config.reports_limit)?;
    Ok(Json(reports))
}
