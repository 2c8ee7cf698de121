//! HTTP API route definitions.

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health, metrics, AppState};
use super::middleware::log_request;
use crate::user;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let logging = state.logging.clone();

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        // User resource
        .merge(user::handler::routes())
        .layer(middleware::from_fn_with_state(logging, log_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
