//! OAuth login, callback and logout endpoints.

use super::session::session_cookie;
use super::{AppError, AuthAppState};
use crate::oauth::CallbackParams;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// GET /auth/login query parameters
#[derive(Deserialize)]
struct LoginQuery {
    /// `false` returns the authorization URL as JSON instead of redirecting
    redirect: Option<bool>,
}

#[derive(Serialize)]
struct LoginResponse {
    auth_url: String,
    state: String,
    message: &'static str,
}

/// OAuth success response
#[derive(Serialize)]
struct CallbackResponse {
    success: bool,
    user_id: String,
    user_login: String,
    scope: Vec<String>,
    message: &'static str,
}

#[derive(Serialize)]
struct LogoutResponse {
    success: bool,
    message: &'static str,
}

/// Create OAuth API router
pub fn create_oauth_router(state: AuthAppState) -> Router {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/logout/:user_id", post(logout))
        .with_state(Arc::new(state))
}

/// GET /auth/login
///
/// Starts a login attempt. Redirects to GitHub's authorization page unless
/// `?redirect=false`, in which case the URL and state are returned as JSON.
async fn login(
    State(state): State<Arc<AuthAppState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let request = state.flow.begin_login().map_err(|e| {
        error!(error = %e, "Failed to initiate OAuth login");
        e
    })?;

    if query.redirect == Some(false) {
        return Ok(Json(LoginResponse {
            auth_url: request.auth_url,
            state: request.state,
            message: "Redirect user to auth_url to complete authentication",
        })
        .into_response());
    }

    Ok(Redirect::temporary(&request.auth_url).into_response())
}

/// GET /auth/callback
///
/// # Security
/// - Validates and consumes the CSRF state before any network call
/// - Never returns the access token; only the resolved identity
async fn callback(
    State(state): State<Arc<AuthAppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let record = state.flow.handle_callback(&params).await?;

    let session_id = state.sessions.create(&record.user_id, &record.user_login);
    let cookie = session_cookie(&state.session_config, &session_id);

    info!(
        user_id = %record.user_id,
        user_login = %record.user_login,
        "User authenticated, session created"
    );

    let body = Json(CallbackResponse {
        success: true,
        user_id: record.user_id,
        user_login: record.user_login,
        scope: record.scope,
        message: "Authentication successful",
    });

    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// POST /auth/logout/:user_id
///
/// Idempotent: logging out a user with no stored credential still succeeds.
async fn logout(
    State(state): State<Arc<AuthAppState>>,
    Path(user_id): Path<String>,
) -> Json<LogoutResponse> {
    state.flow.logout(&user_id);
    let sessions = state.sessions.remove_user(&user_id);
    if sessions > 0 {
        info!(user_id = %user_id, sessions = sessions, "Dropped user sessions");
    }

    Json(LogoutResponse {
        success: true,
        message: "Logged out successfully",
    })
}
