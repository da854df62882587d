//! WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use beamcast_realtime::connection::handle::{CLOSE_POLICY_VIOLATION, WsCommand};

use crate::state::AppState;

/// GET {ws_path} — WebSocket upgrade.
///
/// Origin screening already ran in route middleware; the per-IP admission
/// check happens after the handshake, so the refusal can carry a 1008 close.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let remote_ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    ws.on_upgrade(move |socket| handle_socket(state, socket, remote_ip))
}

/// Derives the client IP: first `X-Forwarded-For` entry when present,
/// otherwise the transport's remote address.
fn client_ip(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| {
            remote_addr
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        })
}

/// Drives one established WebSocket connection.
async fn handle_socket(state: AppState, socket: WebSocket, remote_ip: String) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let Some((handle, mut rx)) = state.engine.dispatcher.register(&remote_ip) else {
        let _ = ws_tx
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_POLICY_VIOLATION,
                reason: "Connection limit exceeded".into(),
            })))
            .await;
        return;
    };
    let conn_id = handle.id.clone();

    // Outbound forwarder: the single writer for this socket.
    let outbound_task = tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                WsCommand::Frame(text) => {
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                WsCommand::Close { code, reason } => {
                    let _ = ws_tx
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    });

    // Inbound loop: the single reader task for this connection.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                state.engine.dispatcher.handle_inbound(&conn_id, &text);
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                // Binary frames are not part of the protocol; control
                // frames are answered by axum itself.
            }
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.engine.dispatcher.unregister(&conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
