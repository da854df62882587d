//! Origin screening for WebSocket upgrades.

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::state::AppState;

/// Refuses upgrade requests whose `Origin` is not in the configured
/// allow-list, before the WebSocket handshake is accepted. A wildcard
/// configuration admits everything.
pub async fn require_allowed_origin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let cors = &state.config.server.cors;
    if !cors.allow_any_origin() {
        let origin = request
            .headers()
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok());
        match origin {
            Some(origin) if cors.origin_allowed(origin) => {}
            other => {
                warn!(
                    origin = other.unwrap_or("<none>"),
                    "WebSocket upgrade refused: origin not allowed"
                );
                return StatusCode::FORBIDDEN.into_response();
            }
        }
    }
    next.run(request).await
}
