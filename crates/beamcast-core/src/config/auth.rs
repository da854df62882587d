//! Channel authorization configuration.

use serde::{Deserialize, Serialize};

/// Development sentinel secret. Startup aborts if this survives into a
/// production deployment.
pub const DEV_SECRET: &str = "beamcast-dev-secret";

/// Channel authorization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret for channel authorization tokens.
    #[serde(default = "default_secret")]
    pub secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
        }
    }
}

fn default_secret() -> String {
    DEV_SECRET.to_string()
}
