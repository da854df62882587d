//! Engine metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total connections accepted.
    pub connections_total: AtomicU64,
    /// Total inbound frames received.
    pub messages_received: AtomicU64,
    /// Total frames delivered to peers.
    pub messages_sent: AtomicU64,
    /// Total successful subscribe operations.
    pub subscriptions_total: AtomicU64,
    /// Total client events fanned out.
    pub client_events_total: AtomicU64,
    /// Total frames refused by the message rate limiter.
    pub rate_limited_total: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted connection.
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one inbound frame.
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record delivered frames.
    pub fn messages_sent_add(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a successful subscription.
    pub fn subscription_added(&self) {
        self.subscriptions_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fanned-out client event.
    pub fn client_event(&self) {
        self.client_events_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rate-limited frame.
    pub fn rate_limited(&self) {
        self.rate_limited_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            subscriptions_total: self.subscriptions_total.load(Ordering::Relaxed),
            client_events_total: self.client_events_total.load(Ordering::Relaxed),
            rate_limited_total: self.rate_limited_total.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever accepted.
    pub connections_total: u64,
    /// Total inbound frames received.
    pub messages_received: u64,
    /// Total frames delivered to peers.
    pub messages_sent: u64,
    /// Total successful subscribe operations.
    pub subscriptions_total: u64,
    /// Total client events fanned out.
    pub client_events_total: u64,
    /// Total frames refused by the rate limiter.
    pub rate_limited_total: u64,
}
