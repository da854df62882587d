//! Individual channel with subscriber tracking.

use dashmap::DashSet;

use crate::connection::id::SocketId;

use super::name::ChannelKind;

/// A pub/sub channel that tracks subscribers.
#[derive(Debug)]
pub struct Channel {
    /// Channel name.
    pub name: String,
    /// Channel type, derived from the name prefix.
    pub kind: ChannelKind,
    /// Set of subscribed connection ids.
    subscribers: DashSet<SocketId>,
}

impl Channel {
    /// Create a new channel; the kind is a pure function of the name.
    pub fn new(name: String) -> Self {
        let kind = ChannelKind::of(&name);
        Self {
            name,
            kind,
            subscribers: DashSet::new(),
        }
    }

    /// Add a subscriber. Returns `false` if it was already present.
    pub fn subscribe(&self, conn_id: SocketId) -> bool {
        self.subscribers.insert(conn_id)
    }

    /// Remove a subscriber. Returns `true` if it was present.
    pub fn unsubscribe(&self, conn_id: &SocketId) -> bool {
        self.subscribers.remove(conn_id).is_some()
    }

    /// Check if a connection is subscribed.
    pub fn is_subscribed(&self, conn_id: &SocketId) -> bool {
        self.subscribers.contains(conn_id)
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Snapshot of all subscriber connection ids.
    pub fn subscriber_ids(&self) -> Vec<SocketId> {
        self.subscribers.iter().map(|r| r.key().clone()).collect()
    }

    /// Check whether the channel has no subscribers left.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
