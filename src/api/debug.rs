//! Debug view of pending OAuth states.

use super::AuthAppState;
use axum::{extract::State, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct PendingStateView {
    state_prefix: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct OAuthStatesResponse {
    total_states: usize,
    states: Vec<PendingStateView>,
}

pub fn create_debug_router(state: AuthAppState) -> Router {
    Router::new()
        .route("/debug/oauth-states", get(oauth_states))
        .with_state(Arc::new(state))
}

/// GET /debug/oauth-states
///
/// Full state tokens are never returned, only an 8-character prefix.
async fn oauth_states(State(state): State<Arc<AuthAppState>>) -> Json<OAuthStatesResponse> {
    let states: Vec<PendingStateView> = state
        .flow
        .states()
        .pending()
        .into_iter()
        .map(|p| PendingStateView {
            state_prefix: p.state_prefix,
            created_at: p.created_at,
            expires_at: p.expires_at,
        })
        .collect();

    Json(OAuthStatesResponse {
        total_states: states.len(),
        states,
    })
}
