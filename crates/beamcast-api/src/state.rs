//! Application state shared across all handlers.

use std::sync::Arc;

use beamcast_core::config::AppConfig;
use beamcast_realtime::auth::ChannelAuth;
use beamcast_realtime::server::{EngineStats, RealtimeEngine};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks. The health and stats
/// handlers only see the read-only [`EngineStats`] view.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// WebSocket realtime engine.
    pub engine: Arc<RealtimeEngine>,
    /// Channel authorization signer.
    pub auth: Arc<ChannelAuth>,
    /// Read-only engine statistics.
    pub stats: Arc<dyn EngineStats>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
