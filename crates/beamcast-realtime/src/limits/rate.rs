//! Fixed-window per-connection message rate limiting.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::connection::id::SocketId;

#[derive(Debug)]
struct Window {
    count: u32,
    started: Instant,
}

/// Counts inbound frames per connection in fixed windows.
///
/// Coarse but predictable: at most one extra frame can straddle a window
/// boundary. Every inbound frame counts, including pings.
#[derive(Debug)]
pub struct MessageRateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<SocketId, Window>,
}

impl MessageRateLimiter {
    /// Creates a limiter admitting `limit` frames per `window_ms`.
    pub fn new(limit: u32, window_ms: u64) -> Self {
        Self {
            limit,
            window: Duration::from_millis(window_ms),
            windows: DashMap::new(),
        }
    }

    /// Consumes one slot of the connection's current window.
    ///
    /// A fresh or expired window restarts at count 1 and admits; otherwise
    /// the frame is admitted iff the incremented count stays within the cap.
    pub fn can_send_message(&self, conn_id: &SocketId) -> bool {
        let now = Instant::now();
        match self.windows.entry(conn_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(Window {
                    count: 1,
                    started: now,
                });
                true
            }
            Entry::Occupied(mut slot) => {
                let window = slot.get_mut();
                if now.duration_since(window.started) >= self.window {
                    window.count = 1;
                    window.started = now;
                    true
                } else {
                    window.count = window.count.saturating_add(1);
                    window.count <= self.limit
                }
            }
        }
    }

    /// Drops rate state for a closed connection.
    pub fn drop_connection(&self, conn_id: &SocketId) {
        self.windows.remove(conn_id);
    }

    /// Removes windows that ended more than one full window ago.
    ///
    /// An active window is at most one window old, so it is never removed.
    pub fn sweep(&self) {
        let horizon = self.window * 2;
        self.windows.retain(|_, w| w.started.elapsed() < horizon);
    }

    /// Number of tracked connections.
    pub fn tracked_connections(&self) -> usize {
        self.windows.len()
    }
}
