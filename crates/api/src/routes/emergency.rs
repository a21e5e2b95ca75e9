//! SOS Routes

use axum::{extract::State, Json};
use sos::{SosAlert, SosOutcome};

use crate::error::ApiError;
use crate::SharedState;

/// Alert the user's emergency contacts
pub async fn send_sos(
    State(state): State<SharedState>,
    Json(alert): Json<SosAlert>,
) -> Result<Json<SosOutcome>, ApiError> {
    let state = state.read().await;
    let user = state
        .repository
        .get_user(&alert.user_id)
        .map_err(ApiError::not_found("User not found"))?;

    let outcome = state
        .dispatcher
        .dispatch(&alert, &user.emergency_contacts)
        .await;

    metrics::counter!("sos_dispatched_total").increment(1);
    Ok(Json(outcome))
}
