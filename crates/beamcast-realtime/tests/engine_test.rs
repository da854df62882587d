//! End-to-end dispatch scenarios driven through registered connections.
//!
//! Each test builds an isolated engine, registers connections to get their
//! outbound receivers, feeds raw frames through the dispatcher, and asserts
//! on the frames the peers would see on the wire.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;

use beamcast_core::config::LimitsConfig;
use beamcast_realtime::RealtimeEngine;
use beamcast_realtime::auth::ChannelAuth;
use beamcast_realtime::connection::handle::{ConnectionHandle, WsCommand};

const SECRET: &str = "top";

struct TestClient {
    handle: Arc<ConnectionHandle>,
    rx: mpsc::Receiver<WsCommand>,
}

impl TestClient {
    /// Drains all queued text frames, parsed as JSON.
    fn frames(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(cmd) = self.rx.try_recv() {
            if let WsCommand::Frame(text) = cmd {
                frames.push(serde_json::from_str(&text).expect("frame is JSON"));
            }
        }
        frames
    }

    /// Drains everything, returning the first queued close command.
    fn next_close(&mut self) -> Option<(u16, &'static str)> {
        while let Ok(cmd) = self.rx.try_recv() {
            if let WsCommand::Close { code, reason } = cmd {
                return Some((code, reason));
            }
        }
        None
    }

    fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

fn engine() -> RealtimeEngine {
    engine_with(LimitsConfig::default())
}

fn engine_with(limits: LimitsConfig) -> RealtimeEngine {
    RealtimeEngine::new(limits, Arc::new(ChannelAuth::new(SECRET)))
}

fn connect(engine: &RealtimeEngine, ip: &str) -> TestClient {
    let (handle, rx) = engine.dispatcher.register(ip).expect("connection admitted");
    TestClient { handle, rx }
}

fn send(engine: &RealtimeEngine, client: &TestClient, frame: &Value) {
    engine
        .dispatcher
        .handle_inbound(&client.handle.id, &frame.to_string());
}

fn subscribe(engine: &RealtimeEngine, client: &TestClient, channel: &str) {
    send(
        engine,
        client,
        &json!({"event": "pusher:subscribe", "channel": channel}),
    );
}

fn subscribe_signed(engine: &RealtimeEngine, client: &TestClient, channel: &str) {
    let token = ChannelAuth::new(SECRET).token(client.handle.id.as_str(), channel);
    send(
        engine,
        client,
        &json!({"event": "pusher:subscribe", "channel": channel, "auth": token}),
    );
}

fn error_message(frame: &Value) -> &str {
    assert_eq!(frame["event"], "pusher:error");
    frame["data"]["message"].as_str().unwrap()
}

#[test]
fn public_fanout_reaches_all_subscribers_including_sender() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");
    let mut b = connect(&engine, "10.0.0.2");

    subscribe(&engine, &a, "public-chat");
    subscribe(&engine, &b, "public-chat");
    a.drain();
    b.drain();

    send(
        &engine,
        &a,
        &json!({"event": "new-message", "channel": "public-chat", "data": {"text": "hi"}}),
    );

    let expected = json!({
        "event": "new-message",
        "channel": "public-chat",
        "data": {"text": "hi"},
    });
    assert_eq!(a.frames(), vec![expected.clone()], "sender receives the echo");
    assert_eq!(b.frames(), vec![expected]);
}

#[test]
fn subscribe_is_acknowledged_idempotently() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    subscribe(&engine, &a, "public-chat");
    subscribe(&engine, &a, "public-chat");

    let frames = a.frames();
    assert_eq!(frames.len(), 2);
    for frame in &frames {
        assert_eq!(frame["event"], "pusher_internal:subscription_succeeded");
        assert_eq!(frame["channel"], "public-chat");
    }
    assert_eq!(engine.channels.subscriber_count("public-chat"), 1);
}

#[test]
fn ping_gets_pong() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    send(&engine, &a, &json!({"event": "pusher:ping"}));

    let frames = a.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "pusher:pong");
}

#[test]
fn private_subscribe_succeeds_with_a_valid_token() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    subscribe_signed(&engine, &a, "private-x");

    let frames = a.frames();
    assert_eq!(frames[0]["event"], "pusher_internal:subscription_succeeded");
    assert!(engine.channels.is_subscribed("private-x", &a.handle.id));
}

#[test]
fn private_subscribe_fails_with_a_foreign_token() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    // Token minted for a different socket id.
    let token = ChannelAuth::new(SECRET).token("43.xyz", "private-x");
    send(
        &engine,
        &a,
        &json!({"event": "pusher:subscribe", "channel": "private-x", "auth": token}),
    );

    let frames = a.frames();
    assert_eq!(error_message(&frames[0]), "Authentication failed");
    assert!(!engine.channels.is_subscribed("private-x", &a.handle.id));
}

#[test]
fn private_subscribe_fails_without_a_token() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    subscribe(&engine, &a, "private-x");

    let frames = a.frames();
    assert_eq!(error_message(&frames[0]), "Authentication failed");
}

#[test]
fn invalid_channel_names_are_rejected() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    subscribe(&engine, &a, "no-prefix!");

    let frames = a.frames();
    assert_eq!(error_message(&frames[0]), "Invalid channel name");
    assert_eq!(engine.channels.count(), 0);
}

#[test]
fn channel_cap_is_enforced_per_connection() {
    let limits = LimitsConfig {
        channel_limit_per_connection: 2,
        ..LimitsConfig::default()
    };
    let engine = engine_with(limits);
    let mut a = connect(&engine, "10.0.0.1");

    subscribe(&engine, &a, "public-one");
    subscribe(&engine, &a, "public-two");
    subscribe(&engine, &a, "public-three");

    let frames = a.frames();
    assert_eq!(frames.len(), 3);
    assert_eq!(error_message(&frames[2]), "Channel limit exceeded");
    assert_eq!(engine.channels.count(), 2);
}

#[test]
fn presence_join_and_leave_are_observed_exactly_once() {
    let engine = engine();
    let mut u1 = connect(&engine, "10.0.0.1");
    let mut u2 = connect(&engine, "10.0.0.2");

    let join = |client: &TestClient, user_id: &str| {
        let token = ChannelAuth::new(SECRET).token(client.handle.id.as_str(), "presence-room");
        json!({
            "event": "pusher:subscribe",
            "channel": "presence-room",
            "auth": token,
            "channel_data": format!(r#"{{"user_id":"{user_id}","user_info":{{"name":"{user_id}"}}}}"#),
        })
    };

    send(&engine, &u1, &join(&u1, "u1"));
    let u1_frames = u1.frames();
    assert_eq!(u1_frames.len(), 1);
    assert_eq!(u1_frames[0]["data"]["presence"]["count"], 1);
    assert!(u1_frames[0]["data"]["presence"]["hash"]["u1"].is_object());

    send(&engine, &u2, &join(&u2, "u2"));

    // U2's acknowledgement carries the full member set including itself.
    let u2_frames = u2.frames();
    assert_eq!(u2_frames.len(), 1, "joiner gets no member_added for itself");
    assert_eq!(u2_frames[0]["event"], "pusher_internal:subscription_succeeded");
    assert_eq!(u2_frames[0]["data"]["presence"]["count"], 2);
    assert!(u2_frames[0]["data"]["presence"]["hash"]["u1"].is_object());
    assert!(u2_frames[0]["data"]["presence"]["hash"]["u2"].is_object());

    // U1 sees exactly one member_added for U2.
    let u1_frames = u1.frames();
    assert_eq!(u1_frames.len(), 1);
    assert_eq!(u1_frames[0]["event"], "pusher_internal:member_added");
    assert_eq!(u1_frames[0]["data"]["user_id"], "u2");

    // U2 disconnects; U1 sees exactly one member_removed.
    engine.dispatcher.unregister(&u2.handle.id);
    let u1_frames = u1.frames();
    assert_eq!(u1_frames.len(), 1);
    assert_eq!(u1_frames[0]["event"], "pusher_internal:member_removed");
    assert_eq!(u1_frames[0]["data"]["user_id"], "u2");

    assert_eq!(engine.presence.member_count("presence-room"), 1);
}

#[test]
fn invalid_presence_channel_data_rolls_back_the_subscription() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    let token = ChannelAuth::new(SECRET).token(a.handle.id.as_str(), "presence-room");
    send(
        &engine,
        &a,
        &json!({
            "event": "pusher:subscribe",
            "channel": "presence-room",
            "auth": token,
            "channel_data": "not json",
        }),
    );

    let frames = a.frames();
    assert_eq!(error_message(&frames[0]), "Invalid channel_data format");
    assert!(!engine.channels.is_subscribed("presence-room", &a.handle.id));
    assert_eq!(engine.channels.count(), 0);
    assert_eq!(engine.presence.channel_count(), 0);
}

#[test]
fn client_events_are_blocked_on_protected_channels() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");
    let mut b = connect(&engine, "10.0.0.2");

    subscribe_signed(&engine, &a, "private-x");
    subscribe_signed(&engine, &b, "private-x");
    a.drain();
    b.drain();

    send(
        &engine,
        &a,
        &json!({"event": "x", "channel": "private-x", "data": {}}),
    );

    let frames = a.frames();
    assert_eq!(
        error_message(&frames[0]),
        "Client events not allowed on private/presence channels"
    );
    assert!(b.frames().is_empty(), "no peer receives the blocked event");
}

#[test]
fn client_events_require_a_subscription() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    send(
        &engine,
        &a,
        &json!({"event": "x", "channel": "public-chat", "data": {}}),
    );

    let frames = a.frames();
    assert_eq!(error_message(&frames[0]), "Not subscribed to channel");
}

#[test]
fn client_events_require_channel_and_data() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    send(&engine, &a, &json!({"event": "x"}));

    let frames = a.frames();
    assert_eq!(
        error_message(&frames[0]),
        "Client events require channel and data"
    );
}

#[test]
fn malformed_json_keeps_the_connection_usable() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    engine.dispatcher.handle_inbound(&a.handle.id, "{nope");
    let frames = a.frames();
    assert_eq!(error_message(&frames[0]), "Invalid JSON format");

    send(&engine, &a, &json!({"event": "pusher:ping"}));
    let frames = a.frames();
    assert_eq!(frames[0]["event"], "pusher:pong");
}

#[test]
fn rate_limit_refuses_excess_frames_until_the_window_turns() {
    let limits = LimitsConfig {
        message_rate_limit: 3,
        message_rate_window_ms: 1_000,
        ..LimitsConfig::default()
    };
    let engine = engine_with(limits);
    let mut a = connect(&engine, "10.0.0.1");

    for _ in 0..4 {
        send(&engine, &a, &json!({"event": "pusher:ping"}));
    }

    let frames = a.frames();
    assert_eq!(frames.len(), 4);
    assert!(frames[..3].iter().all(|f| f["event"] == "pusher:pong"));
    assert_eq!(error_message(&frames[3]), "Rate limit exceeded");

    std::thread::sleep(Duration::from_millis(1_100));
    send(&engine, &a, &json!({"event": "pusher:ping"}));
    let frames = a.frames();
    assert_eq!(frames[0]["event"], "pusher:pong");
}

#[test]
fn per_ip_cap_frees_slots_on_teardown() {
    let limits = LimitsConfig {
        connection_limit_per_ip: 1,
        ..LimitsConfig::default()
    };
    let engine = engine_with(limits);

    let a = connect(&engine, "10.0.0.1");
    assert!(engine.dispatcher.register("10.0.0.1").is_none());
    // Other IPs are unaffected.
    assert!(engine.dispatcher.register("10.0.0.2").is_some());

    engine.dispatcher.unregister(&a.handle.id);
    assert!(engine.dispatcher.register("10.0.0.1").is_some());
}

#[test]
fn unsubscribe_is_a_noop_when_not_subscribed() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    send(
        &engine,
        &a,
        &json!({"event": "pusher:unsubscribe", "channel": "public-chat"}),
    );

    assert!(a.frames().is_empty());
}

#[test]
fn unsubscribe_broadcasts_member_removed_on_presence_channels() {
    let engine = engine();
    let mut u1 = connect(&engine, "10.0.0.1");
    let mut u2 = connect(&engine, "10.0.0.2");

    for (client, user) in [(&u1, "u1"), (&u2, "u2")] {
        let token = ChannelAuth::new(SECRET).token(client.handle.id.as_str(), "presence-room");
        send(
            &engine,
            client,
            &json!({
                "event": "pusher:subscribe",
                "channel": "presence-room",
                "auth": token,
                "channel_data": format!(r#"{{"user_id":"{user}"}}"#),
            }),
        );
    }
    u1.drain();
    u2.drain();

    send(
        &engine,
        &u2,
        &json!({"event": "pusher:unsubscribe", "channel": "presence-room"}),
    );

    let frames = u1.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "pusher_internal:member_removed");
    assert_eq!(frames[0]["data"], json!({"user_id": "u2"}));
    assert!(u2.frames().is_empty(), "the leaver gets no member_removed");
}

#[test]
fn teardown_cleans_registries_and_tolerates_gone_peers() {
    let engine = engine();
    let a = connect(&engine, "10.0.0.1");
    let b = connect(&engine, "10.0.0.1");

    subscribe(&engine, &a, "public-chat");
    subscribe(&engine, &b, "public-chat");

    engine.dispatcher.unregister(&a.handle.id);
    engine.dispatcher.unregister(&b.handle.id);

    assert_eq!(engine.dispatcher.connection_count(), 0);
    assert_eq!(engine.channels.count(), 0);
    assert_eq!(engine.channels.channels_for(&a.handle.id).len(), 0);
}

#[test]
fn server_broadcasts_ignore_channel_type() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    subscribe_signed(&engine, &a, "private-x");
    a.drain();

    engine
        .dispatcher
        .broadcast_server_event("private-x", "deploy-finished", &json!({"version": 7}));

    let frames = a.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(
        frames[0],
        json!({
            "event": "deploy-finished",
            "channel": "private-x",
            "data": {"version": 7},
        })
    );
}

#[test]
fn shutdown_closes_peers_with_1001_and_refuses_new_work() {
    let engine = engine();
    let mut a = connect(&engine, "10.0.0.1");

    engine.shutdown();

    assert_eq!(a.next_close(), Some((1001, "Server shutting down")));
    assert!(engine.dispatcher.register("10.0.0.2").is_none());

    // Frames arriving after shutdown began are ignored.
    send(&engine, &a, &json!({"event": "pusher:ping"}));
    assert!(a.frames().is_empty());
}
