//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate. Each
//! sub-module represents a logical configuration section. The deployment
//! contract is flat environment variables (`PORT`, `AUTH_SECRET`, ...), which
//! the loader maps onto the nested schema as explicit overrides on top of an
//! optional `config/default.toml`.

pub mod auth;
pub mod limits;
pub mod logging;
pub mod server;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::limits::LimitsConfig;
pub use self::logging::LoggingConfig;
pub use self::server::{CorsConfig, ServerConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment: `"development"` or `"production"`.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Channel authorization settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Admission and rate limit settings.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional TOML file and the environment.
    ///
    /// Environment variables always win over file values.
    pub fn load() -> Result<Self, AppError> {
        let env = |name: &str| std::env::var(name).ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .set_override_option("environment", env("APP_ENV"))?
            .set_override_option("server.host", env("HOST"))?
            .set_override_option("server.port", env("PORT"))?
            .set_override_option("server.ws_path", env("WS_PATH"))?
            .set_override_option(
                "server.cors.allowed_origins",
                env("ALLOWED_ORIGINS").map(|v| {
                    v.split(',')
                        .map(|origin| origin.trim().to_string())
                        .collect::<Vec<_>>()
                }),
            )?
            .set_override_option("auth.secret", env("AUTH_SECRET"))?
            .set_override_option(
                "limits.connection_limit_per_ip",
                env("CONNECTION_LIMIT_PER_IP"),
            )?
            .set_override_option(
                "limits.channel_limit_per_connection",
                env("CHANNEL_LIMIT_PER_CONNECTION"),
            )?
            .set_override_option("limits.message_rate_limit", env("MESSAGE_RATE_LIMIT"))?
            .set_override_option(
                "limits.message_rate_window_ms",
                env("MESSAGE_RATE_WINDOW_MS"),
            )?
            .set_override_option("logging.level", env("LOG_LEVEL"))?
            .set_override_option("logging.format", env("LOG_FORMAT"))?
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Validate the loaded configuration.
    ///
    /// The only fatal startup condition: running in production with the
    /// development sentinel secret still in place.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_production() && self.auth.secret == auth::DEV_SECRET {
            return Err(AppError::configuration(
                "AUTH_SECRET must be set in production",
            ));
        }
        if self.limits.message_rate_window_ms == 0 {
            return Err(AppError::configuration(
                "MESSAGE_RATE_WINDOW_MS must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Whether this is a production deployment.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn default_environment() -> String {
    "development".to_string()
}
