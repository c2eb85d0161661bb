//! API Routes
//!
//! Configures the Axum router for the demo server.

use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, me_handler, stats_handler, AppState};
use super::middleware::require_credentials;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /me` - Authenticated caller's claims (credential middleware applied)
/// - `GET /stats` - Token cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = get(me_handler).route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_credentials,
    ));

    Router::new()
        .route("/me", protected)
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
