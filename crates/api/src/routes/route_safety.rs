//! Route Safety Routes

use axum::{extract::State, Json};
use route_safety::{RouteRequest, SafetyAssessment};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiError;
use crate::validation;
use crate::SharedState;

/// Route query body; coordinates are `[lat, lng]`
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub origin: Vec<f64>,
    pub destination: Vec<f64>,
    /// Unix seconds; defaults to now
    pub timestamp: Option<i64>,
}

impl TryFrom<RouteQuery> for RouteRequest {
    type Error = validation::ValidationError;

    fn try_from(query: RouteQuery) -> Result<Self, Self::Error> {
        Ok(RouteRequest {
            origin: validation::coordinate("origin", &query.origin)?,
            destination: validation::coordinate("destination", &query.destination)?,
            timestamp: query.timestamp,
        })
    }
}

/// Score a route against every stored report
pub async fn route_safety(
    State(state): State<SharedState>,
    Json(payload): Json<RouteQuery>,
) -> Result<Json<SafetyAssessment>, ApiError> {
    let request = RouteRequest::try_from(payload)?;

    let state = state.read().await;
    let assessment = state.scorer.assess_from(&request, &state.repository)?;

    debug!(
        "Route {:?} -> {:?}: {} ({:.3})",
        request.origin,
        request.destination,
        assessment.label.as_str(),
        assessment.score
    );
    metrics::counter!("route_safety_assessments_total", "safety" => assessment.label.as_str())
        .increment(1);
    metrics::histogram!("route_safety_score").record(assessment.score);

    Ok(Json(assessment))
}
