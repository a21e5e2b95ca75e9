//! Account Routes
//!
//! Signup, login and profile CRUD. Tokens are issued but not verified by
//! any endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use storage::{NewUser, User, UserUpdate};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::validation;
use crate::SharedState;

const ACCOUNT_NOT_FOUND: &str = "Account not found. Please create an account.";
const USER_NOT_FOUND: &str = "User not found";

/// Login body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Signup body
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub emergency_contacts: Vec<String>,
    pub photo_url: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Issued session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
}

/// Profile update body; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub photo_url: Option<String>,
    pub emergency_contacts: Option<Vec<String>>,
    pub language: Option<String>,
}

/// Log in with matching email and phone
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let state = state.read().await;
    debug!("Login attempt by {}", payload.name);

    let user = state
        .repository
        .find_user_by_credentials(&payload.email, &payload.phone)
        .map_err(ApiError::not_found(ACCOUNT_NOT_FOUND))?;
    let session = state.repository.create_session(user.id)?;

    Ok(Json(SessionResponse {
        token: session.token,
        user_id: user.id.to_string(),
    }))
}

/// Create an account and its first session
pub async fn signup(
    State(state): State<SharedState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    validation::email(&payload.email)?;
    validation::language(&payload.language)?;

    let state = state.read().await;
    validation::emergency_contacts(&payload.emergency_contacts, state.config.max_sos_contacts)?;

    let user = state.repository.create_user(NewUser {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        state: payload.state,
        photo_url: payload.photo_url,
        emergency_contacts: payload.emergency_contacts,
        language: payload.language,
    })?;
    let session = state.repository.create_session(user.id)?;

    info!("New account {}", user.id);
    Ok(Json(SessionResponse {
        token: session.token,
        user_id: user.id.to_string(),
    }))
}

/// Get a profile
pub async fn get_profile(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let state = state.read().await;
    let user = state
        .repository
        .get_user(&user_id)
        .map_err(ApiError::not_found(USER_NOT_FOUND))?;
    Ok(Json(user))
}

/// Apply a partial profile update
pub async fn update_profile(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateProfile>,
) -> Result<Json<Value>, ApiError> {
    if let Some(language) = &payload.language {
        validation::language(language)?;
    }

    let state = state.read().await;
    if let Some(contacts) = &payload.emergency_contacts {
        validation::emergency_contacts(contacts, state.config.max_sos_contacts)?;
    }

    state
        .repository
        .update_user(
            &user_id,
            UserUpdate {
                name: payload.name,
                address: payload.address,
                state: payload.state,
                photo_url: payload.photo_url,
                emergency_contacts: payload.emergency_contacts,
                language: payload.language,
            },
        )
        .map_err(ApiError::not_found(USER_NOT_FOUND))?;

    Ok(Json(json!({ "updated": true })))
}

/// Delete an account; succeeds whether or not it existed
pub async fn delete_account(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let state = state.read().await;
    state.repository.delete_user(&user_id)?;
    Ok(Json(json!({ "deleted": true })))
}
