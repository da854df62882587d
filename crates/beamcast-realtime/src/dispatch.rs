//! Connection dispatcher — routes inbound frames and drives fan-out.
//!
//! Every connection has a single reader task that calls into the dispatcher
//! serially; registries are shared and safe under concurrent access from
//! other connections' readers. Fan-out iterates a subscriber snapshot and
//! tolerates peers vanishing between snapshot and send.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use beamcast_core::config::LimitsConfig;

use crate::auth::ChannelAuth;
use crate::channel::name::{self, ChannelKind};
use crate::channel::registry::ChannelRegistry;
use crate::connection::handle::{CLOSE_GOING_AWAY, ConnectionHandle, WsCommand};
use crate::connection::id::SocketId;
use crate::connection::pool::ConnectionPool;
use crate::limits::AdmissionControl;
use crate::message::envelope::Envelope;
use crate::message::events;
use crate::metrics::EngineMetrics;
use crate::presence::member::PresenceMember;
use crate::presence::registry::PresenceRegistry;

/// Owns per-connection lifecycle and all inbound routing.
#[derive(Debug)]
pub struct ConnectionDispatcher {
    pool: Arc<ConnectionPool>,
    channels: Arc<ChannelRegistry>,
    presence: Arc<PresenceRegistry>,
    admission: Arc<AdmissionControl>,
    auth: Arc<ChannelAuth>,
    metrics: Arc<EngineMetrics>,
    limits: LimitsConfig,
    shutting_down: AtomicBool,
}

impl ConnectionDispatcher {
    /// Creates a dispatcher over injected registries.
    pub fn new(
        limits: LimitsConfig,
        pool: Arc<ConnectionPool>,
        channels: Arc<ChannelRegistry>,
        presence: Arc<PresenceRegistry>,
        admission: Arc<AdmissionControl>,
        auth: Arc<ChannelAuth>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            pool,
            channels,
            presence,
            admission,
            auth,
            metrics,
            limits,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Admits and registers a new connection.
    ///
    /// Returns the handle and the outbound command receiver, or `None` when
    /// the per-IP cap refuses the connection (the caller closes with 1008)
    /// or shutdown has begun.
    pub fn register(
        &self,
        remote_ip: &str,
    ) -> Option<(Arc<ConnectionHandle>, mpsc::Receiver<WsCommand>)> {
        if self.shutting_down.load(Ordering::Relaxed) {
            return None;
        }
        if !self.admission.try_add_connection(remote_ip) {
            warn!(ip = %remote_ip, "Connection refused: per-IP limit reached");
            return None;
        }

        let (tx, rx) = mpsc::channel(self.limits.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(
            SocketId::new(),
            remote_ip.to_string(),
            tx,
        ));
        self.pool.add(handle.clone());
        self.metrics.connection_opened();

        info!(conn_id = %handle.id, ip = %remote_ip, "WebSocket connection registered");
        Some((handle, rx))
    }

    /// Unregisters a connection and reverses all its registrations.
    ///
    /// Channel and presence cleanup runs before the connection leaves the
    /// table, so subscriber sets never reference an unknown connection. A
    /// failed broadcast to one peer never blocks cleanup of the rest.
    pub fn unregister(&self, conn_id: &SocketId) {
        for channel in self.channels.channels_for(conn_id) {
            self.channels.unsubscribe(&channel, conn_id);
            if ChannelKind::of(&channel) == ChannelKind::Presence {
                if let Some(member) = self.presence.remove_member(&channel, conn_id) {
                    self.broadcast(&channel, events::member_removed(&channel, &member.user_id), None);
                }
            }
        }

        if let Some(handle) = self.pool.remove(conn_id) {
            self.admission.release_connection(&handle.remote_ip);
            info!(conn_id = %conn_id, ip = %handle.remote_ip, "WebSocket connection unregistered");
        }
        self.admission.drop_connection(conn_id);
    }

    /// Processes one inbound text frame from a connection's reader task.
    pub fn handle_inbound(&self, conn_id: &SocketId, raw: &str) {
        if self.shutting_down.load(Ordering::Relaxed) {
            return;
        }
        let handle = match self.pool.get(conn_id) {
            Some(h) => h,
            None => {
                warn!(conn_id = %conn_id, "Frame from unknown connection");
                return;
            }
        };

        handle.touch();
        self.metrics.message_received();

        // Admission runs before parsing; malformed frames and pings
        // consume quota too.
        if !self.admission.can_send_message(conn_id) {
            self.metrics.rate_limited();
            self.send_to(&handle, events::error("Rate limit exceeded"));
            return;
        }

        let envelope = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.send_to(&handle, events::error(&e.to_string()));
                return;
            }
        };

        match envelope.event.as_str() {
            events::EVENT_SUBSCRIBE => self.handle_subscribe(&handle, &envelope),
            events::EVENT_UNSUBSCRIBE => self.handle_unsubscribe(&handle, &envelope),
            events::EVENT_PING => self.send_to(&handle, events::pong()),
            _ => self.handle_client_event(&handle, &envelope),
        }
    }

    /// `pusher:subscribe` — validation, quota, auth, registration, presence.
    fn handle_subscribe(&self, handle: &ConnectionHandle, envelope: &Envelope) {
        let Some(channel) = envelope.channel.as_deref() else {
            self.send_to(handle, events::error("Channel name required"));
            return;
        };

        if !name::is_valid(channel) {
            self.send_to(handle, events::error("Invalid channel name"));
            return;
        }

        if self.channels.subscription_count(&handle.id) >= self.limits.channel_limit_per_connection
        {
            self.send_to(handle, events::error("Channel limit exceeded"));
            return;
        }

        // Idempotent acknowledgement for a repeated subscribe.
        if self.channels.is_subscribed(channel, &handle.id) {
            self.send_to(handle, events::subscription_succeeded(channel, &json!({})));
            return;
        }

        let kind = ChannelKind::of(channel);
        if kind.requires_auth() {
            let authorized = envelope
                .auth
                .as_deref()
                .map(|token| self.auth.verify(token, handle.id.as_str(), channel))
                .unwrap_or(false);
            if !authorized {
                debug!(conn_id = %handle.id, channel = %channel, "Subscribe auth failed");
                self.send_to(handle, events::error("Authentication failed"));
                return;
            }
        }

        self.channels.subscribe(channel, &handle.id);
        self.metrics.subscription_added();

        if kind == ChannelKind::Presence {
            let member = match PresenceMember::from_channel_data(
                envelope.channel_data.as_deref(),
                handle.id.as_str(),
            ) {
                Ok(member) => member,
                Err(_) => {
                    // Roll the partial subscription back.
                    self.channels.unsubscribe(channel, &handle.id);
                    self.send_to(handle, events::error("Invalid channel_data format"));
                    return;
                }
            };

            self.presence
                .add_member(channel, handle.id.clone(), member.clone());

            // The joiner sees itself in the success payload; everyone else
            // gets exactly one member_added, and the joiner none.
            self.send_to(
                handle,
                events::subscription_succeeded(channel, &self.presence.presence_data(channel)),
            );
            self.broadcast(
                channel,
                events::member_added(channel, &member.user_id, &member.user_info),
                Some(&handle.id),
            );
        } else {
            self.send_to(handle, events::subscription_succeeded(channel, &json!({})));
        }

        debug!(conn_id = %handle.id, channel = %channel, "Subscribed to channel");
    }

    /// `pusher:unsubscribe` — no-op when not subscribed.
    fn handle_unsubscribe(&self, handle: &ConnectionHandle, envelope: &Envelope) {
        let Some(channel) = envelope.channel.as_deref() else {
            self.send_to(handle, events::error("Channel name required"));
            return;
        };

        if !self.channels.unsubscribe(channel, &handle.id) {
            return;
        }

        if ChannelKind::of(channel) == ChannelKind::Presence {
            if let Some(member) = self.presence.remove_member(channel, &handle.id) {
                self.broadcast(channel, events::member_removed(channel, &member.user_id), None);
            }
        }

        debug!(conn_id = %handle.id, channel = %channel, "Unsubscribed from channel");
    }

    /// Any non-reserved event — echoed to every subscriber, sender included.
    fn handle_client_event(&self, handle: &ConnectionHandle, envelope: &Envelope) {
        let (Some(channel), Some(data)) =
            (envelope.channel.as_deref(), envelope.data.as_deref())
        else {
            self.send_to(handle, events::error("Client events require channel and data"));
            return;
        };

        if !self.channels.is_subscribed(channel, &handle.id) {
            self.send_to(handle, events::error("Not subscribed to channel"));
            return;
        }

        if ChannelKind::of(channel).requires_auth() {
            self.send_to(
                handle,
                events::error("Client events not allowed on private/presence channels"),
            );
            return;
        }

        self.metrics.client_event();
        self.broadcast(channel, events::client_event(&envelope.event, channel, data), None);
    }

    /// Emits a server-initiated event to every subscriber of a channel.
    ///
    /// The server is trusted: channel type and rate limits do not apply.
    pub fn broadcast_server_event(&self, channel: &str, event: &str, data: &Value) {
        self.broadcast(channel, events::server_event(event, channel, data), None);
    }

    /// Begins shutdown: refuse new registrations and inbound frames, and
    /// queue a 1001 close to every open connection.
    pub fn shutdown_all(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        let connections = self.pool.all_connections();
        info!(count = connections.len(), "Closing all connections for shutdown");
        for handle in connections {
            handle.close(CLOSE_GOING_AWAY, "Server shutting down");
        }
    }

    /// Fan-out over a subscriber snapshot.
    ///
    /// Peers missing from the table are skipped; full outbound queues drop
    /// the frame for that peer only.
    fn broadcast(&self, channel: &str, frame: String, exclude: Option<&SocketId>) {
        let subscribers = self.channels.subscribers(channel);
        let mut delivered = 0u64;

        for conn_id in &subscribers {
            if exclude.is_some_and(|excluded| excluded == conn_id) {
                continue;
            }
            let Some(peer) = self.pool.get(conn_id) else {
                continue;
            };
            if peer.send_frame(frame.clone()) {
                delivered += 1;
            } else {
                warn!(conn_id = %conn_id, channel = %channel, "Dropped frame for slow or closed peer");
            }
        }

        self.metrics.messages_sent_add(delivered);
    }

    /// Direct send with the same failure policy as fan-out.
    fn send_to(&self, handle: &ConnectionHandle, frame: String) {
        if handle.send_frame(frame) {
            self.metrics.messages_sent_add(1);
        } else {
            warn!(conn_id = %handle.id, "Dropped frame for slow or closed peer");
        }
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Number of live channels.
    pub fn channel_count(&self) -> usize {
        self.channels.count()
    }

    /// Number of presence channels with members.
    pub fn presence_channel_count(&self) -> usize {
        self.presence.channel_count()
    }
}
