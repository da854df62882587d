//! Channel authorization endpoint.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use beamcast_core::error::AppError;
use beamcast_realtime::channel::name;

use crate::state::AppState;

/// Request body for `POST /auth`.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    /// Socket id of the connection the token is minted for.
    pub socket_id: String,
    /// Channel the client wants to join.
    pub channel_name: String,
    /// Presence member info, echoed back when present.
    pub channel_data: Option<String>,
}

/// Response body for `POST /auth`.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The signed authorization token.
    pub auth: String,
    /// Echoed presence member info.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<String>,
}

/// POST /auth — mint a channel authorization token.
///
/// Stateless by design: the socket id is not checked for liveness here; the
/// binding is enforced at subscribe time on the WebSocket side.
pub async fn authorize(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<AuthResponse>, AppError> {
    let request: AuthRequest = serde_json::from_value(body)
        .map_err(|e| AppError::bad_request(format!("Invalid auth request: {e}")))?;

    if request.socket_id.trim().is_empty() {
        return Err(AppError::validation("socket_id is required"));
    }
    if !name::is_valid(&request.channel_name) {
        return Err(AppError::validation("Invalid channel name"));
    }

    let token = state.auth.token(&request.socket_id, &request.channel_name);

    Ok(Json(AuthResponse {
        auth: token,
        channel_data: request.channel_data,
    }))
}
