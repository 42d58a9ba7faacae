/**
 * Routes Module
 * API route handlers
 */

pub mod admin;
pub mod auth;
pub mod health;
pub mod public;
pub mod upload;

use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::{SessionPhase, SessionState};
use crate::compose::AdminError;
use crate::files::FileError;
use crate::state::AppState;
use crate::store::StoreError;

/// How long an admin request waits for a fresh session's profile.
const SESSION_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            message: None,
        }),
    )
}

/// Maps store failures: `NotFound` is 404, everything else is logged and 500.
pub fn store_error(e: StoreError, notice: &str) -> ApiError {
    if e.is_not_found() {
        return api_error(StatusCode::NOT_FOUND, e.to_string());
    }
    tracing::error!("{}: {}", notice, e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, notice)
}

pub fn admin_error(e: AdminError) -> ApiError {
    let status = match &e {
        AdminError::Forbidden(_) => StatusCode::FORBIDDEN,
        AdminError::Validation(_) => StatusCode::BAD_REQUEST,
        AdminError::NotFound { .. } => StatusCode::NOT_FOUND,
        AdminError::Store { source, .. } if source.is_not_found() => StatusCode::NOT_FOUND,
        AdminError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AdminError::File { source, .. } => match source {
            FileError::InvalidPath(_)
            | FileError::Empty
            | FileError::TooLarge { .. }
            | FileError::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            FileError::NotFound(_) => StatusCode::NOT_FOUND,
            FileError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };
    (
        status,
        Json(ErrorResponse {
            error: e.user_message(),
            message: match status {
                StatusCode::INTERNAL_SERVER_ERROR => None,
                _ => Some(e.to_string()),
            },
        }),
    )
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Resolves the bearer session and waits for it to settle; 401 unless it is Authenticated.
pub async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<SessionState, ApiError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(api_error(StatusCode::UNAUTHORIZED, "Authorization required"));
    };
    let manager = state
        .sessions
        .resolve(token)
        .await
        .map_err(|e| api_error(StatusCode::UNAUTHORIZED, e.to_string()))?;

    let session = manager.wait_until_resolved(SESSION_SETTLE_TIMEOUT).await;
    if session.phase() != SessionPhase::Authenticated {
        return Err(api_error(StatusCode::UNAUTHORIZED, "Authorization required"));
    }
    Ok(session)
}
