//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::id::SocketId;

/// WebSocket close code sent on server shutdown.
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// WebSocket close code sent on admission rejection.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Commands delivered to a connection's socket writer task.
#[derive(Debug)]
pub enum WsCommand {
    /// A serialized text frame to forward to the peer.
    Frame(String),
    /// Close the socket with the given code and reason.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Human-readable close reason.
        reason: &'static str,
    },
}

/// Server-side state for one live WebSocket connection.
///
/// The outbound queue is bounded; sends are best-effort and never block the
/// caller, so one slow peer cannot stall a fan-out loop.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection identifier.
    pub id: SocketId,
    /// Client IP the connection was admitted under.
    pub remote_ip: String,
    /// Queue feeding the socket writer task.
    tx: mpsc::Sender<WsCommand>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Last inbound activity (unix seconds).
    last_activity: AtomicI64,
}

impl ConnectionHandle {
    /// Creates a new connection handle.
    pub fn new(id: SocketId, remote_ip: String, tx: mpsc::Sender<WsCommand>) -> Self {
        let now = Utc::now();
        Self {
            id,
            remote_ip,
            tx,
            connected_at: now,
            last_activity: AtomicI64::new(now.timestamp()),
        }
    }

    /// Queues a text frame. Returns `false` if the peer's queue is full or
    /// its writer task is gone.
    pub fn send_frame(&self, frame: String) -> bool {
        self.tx.try_send(WsCommand::Frame(frame)).is_ok()
    }

    /// Queues a close command.
    pub fn close(&self, code: u16, reason: &'static str) {
        let _ = self.tx.try_send(WsCommand::Close { code, reason });
    }

    /// Updates the last activity timestamp.
    pub fn touch(&self) {
        self.last_activity
            .store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    /// Seconds since the last inbound frame.
    pub fn idle_seconds(&self) -> i64 {
        Utc::now().timestamp() - self.last_activity.load(Ordering::Relaxed)
    }
}
