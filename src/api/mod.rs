// HTTP API: OAuth routes, status queries, browser session, health and debug

mod debug;
mod health;
mod oauth;
mod session;
mod status;

pub use debug::create_debug_router;
pub use health::create_health_router;
pub use oauth::create_oauth_router;
pub use session::create_session_router;
pub use status::create_status_router;

use crate::config::{AppConfig, SessionConfig};
use crate::credentials::TokenStore;
use crate::error::AuthError;
use crate::oauth::AuthFlow;
use crate::resolver::FallbackResolver;
use crate::session::SessionStore;
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{warn, Span};

/// Shared application state for every route group
#[derive(Clone)]
pub struct AuthAppState {
    pub flow: Arc<AuthFlow>,
    pub sessions: Arc<SessionStore>,
    pub resolver: Arc<FallbackResolver>,
    pub session_config: SessionConfig,
}

impl AuthAppState {
    /// Wire the flow, stores and resolver from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let tokens = Arc::new(TokenStore::new());
        let flow = AuthFlow::from_config(config, Arc::clone(&tokens))?;
        let resolver = FallbackResolver::new(tokens, config.github.fallback_token.clone());

        Ok(Self {
            flow: Arc::new(flow),
            sessions: Arc::new(SessionStore::with_idle_timeout(
                config.session.idle_timeout_seconds,
            )),
            resolver: Arc::new(resolver),
            session_config: config.session.clone(),
        })
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        self.flow.tokens()
    }
}

/// Merge every route group and apply CORS and request tracing
pub fn create_app(state: AuthAppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(create_oauth_router(state.clone()))
        .merge(create_status_router(state.clone()))
        .merge(create_session_router(state.clone()))
        .merge(create_debug_router(state.clone()))
        .merge(create_health_router(state))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
}

/// Request span carrying only the path. Query strings hold OAuth codes and
/// state tokens and must stay out of the logs.
fn request_span(req: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        version = ?req.version(),
    )
}

/// Any origin when none are configured, otherwise the listed origins with credentials
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

/// Application error types for the HTTP layer
#[derive(Debug)]
pub(crate) enum AppError {
    Auth(AuthError),
    Unauthorized(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Auth(e) => {
                let status = match &e {
                    AuthError::OAuthNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                    AuthError::InvalidState
                    | AuthError::MissingCode
                    | AuthError::AuthorizationDenied { .. } => StatusCode::BAD_REQUEST,
                    AuthError::ExchangeFailed(_) | AuthError::IdentityUnresolved => {
                        StatusCode::BAD_GATEWAY
                    }
                    AuthError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
                };
                let hint = if e.restart_login() {
                    Some("Restart the login flow at /auth/login")
                } else if matches!(e, AuthError::UpstreamUnavailable(_)) {
                    Some("GitHub could not be reached; try again shortly")
                } else {
                    None
                };
                let body = ErrorResponse {
                    error: e.to_string(),
                    code: e.code(),
                    hint,
                };
                (status, body)
            }
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: msg,
                    code: "unauthorized",
                    hint: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}
