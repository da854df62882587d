//! Admission control and rate limit configuration.

use serde::{Deserialize, Serialize};

/// Admission and rate limit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent WebSocket connections per client IP.
    #[serde(default = "default_connection_limit_per_ip")]
    pub connection_limit_per_ip: usize,
    /// Maximum channel subscriptions per connection.
    #[serde(default = "default_channel_limit_per_connection")]
    pub channel_limit_per_connection: usize,
    /// Maximum inbound frames per connection per rate window.
    #[serde(default = "default_message_rate_limit")]
    pub message_rate_limit: u32,
    /// Length of the fixed rate window in milliseconds.
    #[serde(default = "default_message_rate_window_ms")]
    pub message_rate_window_ms: u64,
    /// Per-connection outbound queue capacity.
    #[serde(default = "default_channel_buffer_size")]
    pub channel_buffer_size: usize,
    /// Interval between rate-limiter sweep passes in seconds.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            connection_limit_per_ip: default_connection_limit_per_ip(),
            channel_limit_per_connection: default_channel_limit_per_connection(),
            message_rate_limit: default_message_rate_limit(),
            message_rate_window_ms: default_message_rate_window_ms(),
            channel_buffer_size: default_channel_buffer_size(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

fn default_connection_limit_per_ip() -> usize {
    10
}

fn default_channel_limit_per_connection() -> usize {
    50
}

fn default_message_rate_limit() -> u32 {
    100
}

fn default_message_rate_window_ms() -> u64 {
    60_000
}

fn default_channel_buffer_size() -> usize {
    256
}

fn default_sweep_interval_seconds() -> u64 {
    300
}
