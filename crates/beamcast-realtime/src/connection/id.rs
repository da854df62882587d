//! Socket identifiers.

use serde::{Deserialize, Serialize};

/// Opaque per-connection identifier, unique for the process lifetime.
///
/// Wire format: `<unix_ms>.<random>`. The id is surfaced to clients and used
/// as the subject of channel authorization tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocketId(String);

impl SocketId {
    /// Mints a fresh socket id.
    pub fn new() -> Self {
        let unix_ms = chrono::Utc::now().timestamp_millis();
        let nonce: u32 = rand::random();
        Self(format!("{unix_ms}.{nonce}"))
    }

    /// Wraps an existing id string (tests, trusted callers).
    pub fn from_raw(id: &str) -> Self {
        Self(id.to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
