/**
 * Authentication Routes
 * Login creates a session, logout ends it, session reports its state
 */
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

use super::{api_error, extract_bearer_token, ErrorResponse};
use crate::auth::{AuthError, Capabilities, SessionState};
use crate::state::AppState;

/// How long login waits for the new session's profile before answering.
const PROFILE_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session state plus the capabilities derived from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub state: SessionState,
    #[serde(flatten)]
    pub capabilities: Capabilities,
}

impl From<SessionState> for SessionResponse {
    fn from(state: SessionState) -> Self {
        Self {
            capabilities: state.capabilities(),
            state,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: i64,
    pub session: SessionResponse,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

fn auth_error_status(e: &AuthError) -> StatusCode {
    match e {
        AuthError::MissingCredentials | AuthError::InvalidEmail => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
        AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        AuthError::Token(_) | AuthError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_error(e: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    let status = auth_error_status(&e);
    if status.is_server_error() {
        tracing::error!("authentication failure: {}", e);
    }
    api_error(status, e.to_string())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let ip = addr.ip().to_string();
    if !state.login_limiter.check(&ip).await {
        tracing::warn!(ip = %ip, "login rate limited");
        return auth_error(AuthError::RateLimited).into_response();
    }

    let issued = match state.sessions.login(&payload.email, &payload.password).await {
        Ok(issued) => issued,
        Err(e) => return auth_error(e).into_response(),
    };

    let session = issued
        .manager
        .wait_for_user(&issued.identity.uid, PROFILE_WAIT)
        .await;

    (
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            token: issued.token,
            expires_at: issued.expires_at,
            session: session.into(),
        }),
    )
        .into_response()
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return api_error(StatusCode::UNAUTHORIZED, "Authorization required").into_response();
    };
    match state.sessions.logout(token).await {
        Ok(()) => (StatusCode::OK, Json(LogoutResponse { success: true })).into_response(),
        Err(e) => auth_error(e).into_response(),
    }
}

/// GET /api/auth/session
/// No token, or one naming no live session, reads as anonymous.
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let anonymous = SessionState {
        loading: false,
        user: None,
        profile: None,
        resolving: false,
    };
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(SessionResponse::from(anonymous));
    };
    match state.sessions.resolve(token).await {
        Ok(manager) => Json(SessionResponse::from(manager.snapshot())),
        Err(_) => Json(SessionResponse::from(anonymous)),
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{self, empty_request, json_request, login, send};
    use crate::state::testing::{state, READER, WRITER};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::json;
    use std::net::SocketAddr;

    async fn app() -> Router {
        let (state, _) = state().await;
        testing::app(state)
    }

    #[tokio::test]
    async fn test_login_returns_token_and_resolved_profile() {
        let app = app().await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                &json!({ "email": READER.0, "password": READER.1 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["token"].is_string());
        assert_eq!(body["session"]["loading"], false);
        assert_eq!(body["session"]["profile"]["role"], "read");
        assert_eq!(body["session"]["canWrite"], false);
        assert_eq!(body["session"]["isSuperuser"], false);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let app = app().await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                &json!({ "email": WRITER.0, "password": "wrong" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/auth/login",
                None,
                &json!({ "email": "", "password": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_reflects_login_and_logout() {
        let app = app().await;
        let (status, body) = send(&app, empty_request("GET", "/api/auth/session", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], serde_json::Value::Null);

        let token = login(&app, WRITER.0, WRITER.1).await;
        let (_, body) = send(&app, empty_request("GET", "/api/auth/session", Some(&token))).await;
        assert_eq!(body["user"]["email"], WRITER.0);
        assert_eq!(body["canWrite"], true);

        let (status, body) = send(&app, empty_request("POST", "/api/auth/logout", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = send(&app, empty_request("GET", "/api/auth/session", Some(&token))).await;
        assert_eq!(body["user"], serde_json::Value::Null);

        let (status, _) = send(&app, empty_request("POST", "/api/auth/logout", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_rate_limit() {
        let (state, _) = state().await;
        let state = crate::state::AppState {
            login_limiter: std::sync::Arc::new(crate::auth::LoginRateLimiter::new(1)),
            ..state
        };
        let app = crate::create_app(state)
            .layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));
        let body = json!({ "email": READER.0, "password": "wrong" });

        let (status, _) = send(&app, json_request("POST", "/api/auth/login", None, &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) = send(&app, json_request("POST", "/api/auth/login", None, &body)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests. Please try again later.");
    }
}
