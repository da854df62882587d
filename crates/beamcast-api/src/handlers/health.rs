//! Health and stats handlers.

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use beamcast_realtime::metrics::MetricsSnapshot;
use beamcast_realtime::server::StatsSnapshot;

use crate::state::AppState;

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    /// Server time.
    pub timestamp: DateTime<Utc>,
    /// Engine gauge counters.
    pub stats: StatsSnapshot,
}

/// Response body for `GET /admin/stats`.
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    /// Server time.
    pub timestamp: DateTime<Utc>,
    /// Engine gauge counters.
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    /// Cumulative engine counters.
    pub metrics: MetricsSnapshot,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        stats: state.stats.stats(),
    })
}

/// GET /admin/stats — intended to sit behind external auth in production.
pub async fn admin_stats(State(state): State<AppState>) -> Json<AdminStatsResponse> {
    Json(AdminStatsResponse {
        timestamp: Utc::now(),
        stats: state.stats.stats(),
        metrics: state.stats.metrics(),
    })
}
