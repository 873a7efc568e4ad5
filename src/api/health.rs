use super::AuthAppState;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    oauth_configured: bool,
}

pub fn create_health_router(state: AuthAppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(Arc::new(state))
}

/// GET /health: liveness ack
async fn health_check(State(state): State<Arc<AuthAppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "repochat",
        oauth_configured: state.flow.is_configured(),
    })
}
