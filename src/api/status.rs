//! Read-only authentication status endpoints.

use super::{AppError, AuthAppState};
use crate::status::{self, AuthStatus, TokenInfo};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// List users response
#[derive(Serialize)]
struct ListUsersResponse {
    users: Vec<String>,
    count: usize,
}

#[derive(Deserialize)]
struct ResolveQuery {
    user_id: Option<String>,
}

/// Which credential a request for `user_id` would use. Never the token itself.
#[derive(Serialize)]
struct ResolveResponse {
    authenticated: bool,
    source: Option<&'static str>,
}

pub fn create_status_router(state: AuthAppState) -> Router {
    Router::new()
        .route("/auth/status/:user_id", get(get_status))
        .route("/auth/users", get(list_users))
        .route("/auth/token/:user_id", get(get_token_info))
        .route("/auth/resolve", get(resolve))
        .with_state(Arc::new(state))
}

/// GET /auth/status/:user_id
async fn get_status(
    State(state): State<Arc<AuthAppState>>,
    Path(user_id): Path<String>,
) -> Json<AuthStatus> {
    Json(status::status(state.tokens(), &user_id))
}

/// GET /auth/users
async fn list_users(State(state): State<Arc<AuthAppState>>) -> Json<ListUsersResponse> {
    let users = status::list_users(state.tokens());
    Json(ListUsersResponse {
        count: users.len(),
        users,
    })
}

/// GET /auth/token/:user_id (redacted)
async fn get_token_info(
    State(state): State<Arc<AuthAppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<TokenInfo>, AppError> {
    Ok(Json(status::token_info(state.tokens(), &user_id)?))
}

/// GET /auth/resolve?user_id=...
async fn resolve(
    State(state): State<Arc<AuthAppState>>,
    Query(query): Query<ResolveQuery>,
) -> Json<ResolveResponse> {
    let resolution = state.resolver.resolve_credential(query.user_id.as_deref());
    Json(ResolveResponse {
        authenticated: resolution.token().is_some(),
        source: resolution.source(),
    })
}
