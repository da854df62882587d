//! Admission control: per-IP connection caps and per-connection message rates.
//!
//! The per-connection channel cap is enforced inline by the dispatcher's
//! subscribe handler against the subscription tracker.

pub mod ip;
pub mod rate;

use beamcast_core::config::LimitsConfig;

use crate::connection::id::SocketId;

use self::ip::IpConnectionLimiter;
use self::rate::MessageRateLimiter;

/// Facade over the per-IP connection limiter and the per-connection
/// message-rate limiter.
#[derive(Debug)]
pub struct AdmissionControl {
    ip: IpConnectionLimiter,
    rate: MessageRateLimiter,
}

impl AdmissionControl {
    /// Creates admission state from the configured limits.
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            ip: IpConnectionLimiter::new(config.connection_limit_per_ip),
            rate: MessageRateLimiter::new(
                config.message_rate_limit,
                config.message_rate_window_ms,
            ),
        }
    }

    /// Whether a new connection from this IP would currently be admitted.
    pub fn can_connect(&self, ip: &str) -> bool {
        self.ip.can_connect(ip)
    }

    /// Atomically admits and counts a connection from this IP.
    pub fn try_add_connection(&self, ip: &str) -> bool {
        self.ip.try_add_connection(ip)
    }

    /// Releases one connection slot for this IP.
    pub fn release_connection(&self, ip: &str) {
        self.ip.remove_connection(ip);
    }

    /// Consumes one slot of the connection's message window.
    pub fn can_send_message(&self, conn_id: &SocketId) -> bool {
        self.rate.can_send_message(conn_id)
    }

    /// Drops per-connection rate state (on teardown).
    pub fn drop_connection(&self, conn_id: &SocketId) {
        self.rate.drop_connection(conn_id);
    }

    /// Removes stale rate windows. Run periodically by the engine.
    pub fn sweep(&self) {
        self.rate.sweep();
    }
}
