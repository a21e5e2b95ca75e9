//! API error responses
//!
//! Errors render as `{"detail": "..."}` with a matching status code.

use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use storage::StorageError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a storage miss to a route-specific not-found message
    pub fn not_found(message: &str) -> impl FnOnce(StorageError) -> ApiError + '_ {
        move |err| match err {
            StorageError::NotFound => ApiError::NotFound(message.to_string()),
            other => ApiError::from(other),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ApiError::NotFound("Record not found".to_string()),
            StorageError::Duplicate(message) => ApiError::BadRequest(message),
            StorageError::DatabaseError(message) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
