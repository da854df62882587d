//! Route definitions for the beamcast HTTP/WebSocket surface.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use beamcast_core::config::CorsConfig;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
///
/// The WebSocket path is configurable; everything else is fixed. Origin
/// screening wraps only the upgrade route, so it runs before the handshake
/// is accepted.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    let ws_path = state.config.server.ws_path.clone();

    let ws_routes = Router::new()
        .route(&ws_path, get(handlers::ws::ws_upgrade))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::origin::require_allowed_origin,
        ));

    Router::new()
        .route("/auth", post(handlers::auth::authorize))
        .route("/health", get(handlers::health::health))
        .route("/admin/stats", get(handlers::health::admin_stats))
        .merge(ws_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Build the CORS layer from configuration. Permissive by default.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allow_any_origin() {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    layer
}
