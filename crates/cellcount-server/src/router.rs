//! Axum router construction for the counts API.
//!
//! Assembles all routes into a single [`Router`] with CORS enabled for the
//! browser map client and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `POST /v1/counts/{kind}` -- counts via the worker pool
/// - `POST /v1/counts/serial/{kind}` -- counts via the serial baseline
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/counts/serial/{kind}", post(handlers::count_serial))
        .route("/v1/counts/{kind}", post(handlers::count))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
