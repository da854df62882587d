//! Top-level realtime engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use beamcast_core::config::LimitsConfig;

use crate::auth::ChannelAuth;
use crate::channel::registry::ChannelRegistry;
use crate::connection::pool::ConnectionPool;
use crate::dispatch::ConnectionDispatcher;
use crate::limits::AdmissionControl;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::presence::registry::PresenceRegistry;

/// Central realtime engine coordinating all WebSocket subsystems.
///
/// Every subsystem is constructor-injected, so tests can instantiate fully
/// isolated engines. Nothing here is process-global.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection dispatcher.
    pub dispatcher: Arc<ConnectionDispatcher>,
    /// Channel registry.
    pub channels: Arc<ChannelRegistry>,
    /// Presence registry.
    pub presence: Arc<PresenceRegistry>,
    /// Admission control.
    pub admission: Arc<AdmissionControl>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
    /// Sweep interval for the rate-limiter background task.
    sweep_interval: Duration,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new realtime engine with all subsystems.
    pub fn new(limits: LimitsConfig, auth: Arc<ChannelAuth>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let pool = Arc::new(ConnectionPool::new());
        let channels = Arc::new(ChannelRegistry::new());
        let presence = Arc::new(PresenceRegistry::new());
        let admission = Arc::new(AdmissionControl::new(&limits));
        let metrics = Arc::new(EngineMetrics::new());
        let sweep_interval = Duration::from_secs(limits.sweep_interval_seconds.max(1));
        let dispatcher = Arc::new(ConnectionDispatcher::new(
            limits,
            pool,
            channels.clone(),
            presence.clone(),
            admission.clone(),
            auth,
            metrics.clone(),
        ));

        info!("Realtime engine initialized");

        Self {
            dispatcher,
            channels,
            presence,
            admission,
            metrics,
            shutdown_tx,
            sweep_interval,
        }
    }

    /// Starts the rate-limiter sweeper as a background task owned by this
    /// engine's lifetime; it stops when shutdown is signalled.
    pub fn start_sweeper(&self) {
        let admission = self.admission.clone();
        let interval = self.sweep_interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        admission.sweep();
                        debug!("Rate limiter sweep complete");
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown: stops background tasks and closes
    /// every open connection with code 1001.
    pub fn shutdown(&self) {
        info!("Shutting down realtime engine");
        let _ = self.shutdown_tx.send(());
        self.dispatcher.shutdown_all();
    }
}

/// Read-only view of engine state for the HTTP surface.
pub trait EngineStats: Send + Sync {
    /// Current gauge counters.
    fn stats(&self) -> StatsSnapshot;
    /// Cumulative metrics counters.
    fn metrics(&self) -> MetricsSnapshot;
}

/// Point-in-time gauge counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Live WebSocket connections.
    pub connections: usize,
    /// Live channels.
    pub channels: usize,
    /// Presence channels with at least one member.
    #[serde(rename = "presenceChannels")]
    pub presence_channels: usize,
}

impl EngineStats for RealtimeEngine {
    fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections: self.dispatcher.connection_count(),
            channels: self.dispatcher.channel_count(),
            presence_channels: self.dispatcher.presence_channel_count(),
        }
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
