//! Cookie-backed browser session endpoints.

use super::{AppError, AuthAppState};
use crate::config::SessionConfig;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct CurrentUserResponse {
    user_id: String,
    user_login: String,
    authenticated: bool,
}

pub fn create_session_router(state: AuthAppState) -> Router {
    Router::new()
        .route("/api/user", get(current_user))
        .route("/auth/logout", get(logout_session))
        .with_state(Arc::new(state))
}

/// GET /api/user
async fn current_user(
    State(state): State<Arc<AuthAppState>>,
    headers: HeaderMap,
) -> Result<Json<CurrentUserResponse>, AppError> {
    let session = session_id_from_headers(&headers, &state.session_config.cookie_name)
        .and_then(|id| state.sessions.touch(&id))
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(CurrentUserResponse {
        user_id: session.user_id,
        user_login: session.user_login,
        authenticated: true,
    }))
}

/// GET /auth/logout
///
/// Ends the browser session: drops the session and its user's credential,
/// clears the cookie and redirects home.
async fn logout_session(State(state): State<Arc<AuthAppState>>, headers: HeaderMap) -> Response {
    if let Some(session) = session_id_from_headers(&headers, &state.session_config.cookie_name)
        .and_then(|id| state.sessions.remove(&id))
    {
        state.flow.logout(&session.user_id);
        info!(user_id = %session.user_id, "Session logged out");
    }

    let cookie = clear_session_cookie(&state.session_config);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// `Set-Cookie` value for a new session
pub(super) fn session_cookie(config: &SessionConfig, session_id: &str) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax",
        config.cookie_name, session_id
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie(config: &SessionConfig) -> String {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax",
        config.cookie_name
    )
}

/// Extract the session id from any `Cookie` header
fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc123; lang=en"),
        );

        assert_eq!(
            session_id_from_headers(&headers, "session_id"),
            Some("abc123".to_string())
        );
        assert_eq!(session_id_from_headers(&headers, "missing"), None);
    }

    #[test]
    fn test_empty_cookie_value_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_id="));
        assert_eq!(session_id_from_headers(&headers, "session_id"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = SessionConfig::default();
        let cookie = session_cookie(&config, "abc");
        assert_eq!(cookie, "session_id=abc; HttpOnly; Path=/; SameSite=Lax");

        config.secure_cookie = true;
        assert!(session_cookie(&config, "abc").ends_with("; Secure"));
        assert!(clear_session_cookie(&config).contains("Max-Age=0"));
    }
}
