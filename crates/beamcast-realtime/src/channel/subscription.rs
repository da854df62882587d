//! Subscription tracking — which connections are subscribed to which channels.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::id::SocketId;

/// Tracks connection-to-channel subscription mappings (reverse index).
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection id → set of channel names.
    conn_to_channels: DashMap<SocketId, HashSet<String>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self {
            conn_to_channels: DashMap::new(),
        }
    }

    /// Records a subscription.
    pub fn add(&self, conn_id: SocketId, channel: String) {
        self.conn_to_channels
            .entry(conn_id)
            .or_default()
            .insert(channel);
    }

    /// Removes a subscription; drops the connection entry when empty.
    pub fn remove(&self, conn_id: &SocketId, channel: &str) {
        if let Some(mut channels) = self.conn_to_channels.get_mut(conn_id) {
            channels.remove(channel);
            if channels.is_empty() {
                drop(channels);
                self.conn_to_channels
                    .remove_if(conn_id, |_, set| set.is_empty());
            }
        }
    }

    /// Whether the connection is subscribed to the channel.
    pub fn contains(&self, conn_id: &SocketId, channel: &str) -> bool {
        self.conn_to_channels
            .get(conn_id)
            .map(|entry| entry.contains(channel))
            .unwrap_or(false)
    }

    /// Gets all channels a connection is subscribed to.
    pub fn channels(&self, conn_id: &SocketId) -> Vec<String> {
        self.conn_to_channels
            .get(conn_id)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of subscriptions for a connection.
    pub fn count(&self, conn_id: &SocketId) -> usize {
        self.conn_to_channels
            .get(conn_id)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}
