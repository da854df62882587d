//! Presence registry — per-channel member records keyed by connection id.

use std::collections::HashMap;

use dashmap::DashMap;
use serde_json::{Map, Value, json};

use crate::connection::id::SocketId;

use super::member::PresenceMember;

/// Tracks presence members for all presence channels.
///
/// State is keyed by connection id so leave accounting stays exact when the
/// same `user_id` joins from multiple connections. Only the transmitted hash
/// flattens to `user_id` keys (last write wins).
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    /// Channel name → (connection id → member record).
    channels: DashMap<String, HashMap<SocketId, PresenceMember>>,
}

impl PresenceRegistry {
    /// Creates a new presence registry.
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Adds (or replaces) the member record for a connection.
    pub fn add_member(&self, channel: &str, conn_id: SocketId, member: PresenceMember) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(conn_id, member);
    }

    /// Removes and returns the member record for a connection.
    ///
    /// Drops the channel entry when the last member leaves.
    pub fn remove_member(&self, channel: &str, conn_id: &SocketId) -> Option<PresenceMember> {
        let mut removed = None;
        if let Some(mut members) = self.channels.get_mut(channel) {
            removed = members.remove(conn_id);
            if members.is_empty() {
                drop(members);
                self.channels.remove_if(channel, |_, m| m.is_empty());
            }
        }
        removed
    }

    /// Whether the connection has a member record on the channel.
    pub fn has_member(&self, channel: &str, conn_id: &SocketId) -> bool {
        self.channels
            .get(channel)
            .map(|members| members.contains_key(conn_id))
            .unwrap_or(false)
    }

    /// Returns the member record for a connection, if any.
    pub fn get_member(&self, channel: &str, conn_id: &SocketId) -> Option<PresenceMember> {
        self.channels
            .get(channel)
            .and_then(|members| members.get(conn_id).cloned())
    }

    /// Snapshot of all members on a channel.
    pub fn members(&self, channel: &str) -> Vec<(SocketId, PresenceMember)> {
        self.channels
            .get(channel)
            .map(|members| {
                members
                    .iter()
                    .map(|(id, m)| (id.clone(), m.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of member records on a channel (connections, not distinct users).
    pub fn member_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    /// Number of presence channels with at least one member.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Wire-shaped presence payload for `subscription_succeeded`:
    /// `{"presence": {"hash": {user_id: user_info}, "count": N}}`.
    ///
    /// `count` is the number of connections; the hash is keyed by `user_id`,
    /// so duplicate user ids collapse to one entry.
    pub fn presence_data(&self, channel: &str) -> Value {
        let (hash, count) = self
            .channels
            .get(channel)
            .map(|members| {
                let mut hash = Map::new();
                for member in members.values() {
                    hash.insert(member.user_id.clone(), member.user_info.clone());
                }
                (hash, members.len())
            })
            .unwrap_or_default();

        json!({
            "presence": {
                "hash": hash,
                "count": count,
            }
        })
    }
}
