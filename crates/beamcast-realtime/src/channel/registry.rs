//! Channel registry — manages all channels and subscriptions.

use dashmap::DashMap;

use crate::connection::id::SocketId;

use super::channel::Channel;
use super::subscription::SubscriptionTracker;

/// Registry of all active pub/sub channels.
///
/// Channels are created lazily on first subscribe and removed as soon as the
/// last subscriber leaves, so an empty channel is never observable.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channel name → Channel.
    channels: DashMap<String, Channel>,
    /// Subscription tracker (reverse index).
    subscriptions: SubscriptionTracker,
}

impl ChannelRegistry {
    /// Creates a new channel registry.
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            subscriptions: SubscriptionTracker::new(),
        }
    }

    /// Subscribes a connection to a channel, creating the channel if absent.
    ///
    /// Idempotent: returns `false` if the connection was already subscribed.
    pub fn subscribe(&self, channel_name: &str, conn_id: &SocketId) -> bool {
        let added = self
            .channels
            .entry(channel_name.to_string())
            .or_insert_with(|| Channel::new(channel_name.to_string()))
            .subscribe(conn_id.clone());

        if added {
            self.subscriptions
                .add(conn_id.clone(), channel_name.to_string());
        }
        added
    }

    /// Unsubscribes a connection from a channel. No-op if absent.
    ///
    /// Removes the channel entry when its subscriber set becomes empty.
    pub fn unsubscribe(&self, channel_name: &str, conn_id: &SocketId) -> bool {
        let mut removed = false;
        if let Some(channel) = self.channels.get(channel_name) {
            removed = channel.unsubscribe(conn_id);
            if channel.is_empty() {
                drop(channel);
                self.channels.remove_if(channel_name, |_, ch| ch.is_empty());
            }
        }
        if removed {
            self.subscriptions.remove(conn_id, channel_name);
        }
        removed
    }

    /// Whether the connection is subscribed to the channel.
    pub fn is_subscribed(&self, channel_name: &str, conn_id: &SocketId) -> bool {
        self.subscriptions.contains(conn_id, channel_name)
    }

    /// Snapshot of all subscriber connection ids for a channel.
    ///
    /// Safe to iterate during fan-out without holding any registry lock.
    pub fn subscribers(&self, channel_name: &str) -> Vec<SocketId> {
        self.channels
            .get(channel_name)
            .map(|ch| ch.subscriber_ids())
            .unwrap_or_default()
    }

    /// All channels containing the connection (used on teardown).
    pub fn channels_for(&self, conn_id: &SocketId) -> Vec<String> {
        self.subscriptions.channels(conn_id)
    }

    /// Returns the subscription count for a connection.
    pub fn subscription_count(&self, conn_id: &SocketId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns subscriber count for a channel.
    pub fn subscriber_count(&self, channel_name: &str) -> usize {
        self.channels
            .get(channel_name)
            .map(|ch| ch.subscriber_count())
            .unwrap_or(0)
    }

    /// Returns total number of live channels.
    pub fn count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> SocketId {
        SocketId::from_raw(id)
    }

    #[test]
    fn subscribe_creates_channel_lazily() {
        let registry = ChannelRegistry::new();
        assert_eq!(registry.count(), 0);

        assert!(registry.subscribe("public-chat", &conn("1.a")));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.subscriber_count("public-chat"), 1);
    }

    #[test]
    fn subscribe_is_idempotent() {
        let registry = ChannelRegistry::new();
        let c = conn("1.a");
        assert!(registry.subscribe("public-chat", &c));
        assert!(!registry.subscribe("public-chat", &c));
        assert_eq!(registry.subscriber_count("public-chat"), 1);
        assert_eq!(registry.subscription_count(&c), 1);
    }

    #[test]
    fn empty_channels_are_garbage_collected() {
        let registry = ChannelRegistry::new();
        let a = conn("1.a");
        let b = conn("2.b");
        registry.subscribe("public-chat", &a);
        registry.subscribe("public-chat", &b);

        registry.unsubscribe("public-chat", &a);
        assert_eq!(registry.count(), 1);

        registry.unsubscribe("public-chat", &b);
        assert_eq!(registry.count(), 0);
        assert!(registry.subscribers("public-chat").is_empty());
    }

    #[test]
    fn unsubscribe_of_absent_connection_is_noop() {
        let registry = ChannelRegistry::new();
        assert!(!registry.unsubscribe("public-chat", &conn("1.a")));
    }

    #[test]
    fn channels_for_tracks_teardown_set() {
        let registry = ChannelRegistry::new();
        let c = conn("1.a");
        registry.subscribe("public-chat", &c);
        registry.subscribe("private-x", &c);

        let mut channels = registry.channels_for(&c);
        channels.sort();
        assert_eq!(channels, vec!["private-x", "public-chat"]);

        registry.unsubscribe("public-chat", &c);
        registry.unsubscribe("private-x", &c);
        assert!(registry.channels_for(&c).is_empty());
        assert_eq!(registry.subscription_count(&c), 0);
    }

    #[test]
    fn subscribers_returns_a_snapshot() {
        let registry = ChannelRegistry::new();
        let a = conn("1.a");
        let b = conn("2.b");
        registry.subscribe("public-chat", &a);
        registry.subscribe("public-chat", &b);

        let snapshot = registry.subscribers("public-chat");
        registry.unsubscribe("public-chat", &a);
        // The snapshot is unaffected by later mutation.
        assert_eq!(snapshot.len(), 2);
        assert_eq!(registry.subscriber_count("public-chat"), 1);
    }
}
