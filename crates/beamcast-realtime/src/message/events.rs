//! Reserved protocol event names and outbound frame builders.
//!
//! Builders return fully serialized frames so a broadcast serializes once and
//! hands the same bytes to every peer.

use serde::Serialize;
use serde_json::Value;
use serde_json::value::RawValue;

/// Client → server: subscribe to a channel.
pub const EVENT_SUBSCRIBE: &str = "pusher:subscribe";
/// Client → server: unsubscribe from a channel.
pub const EVENT_UNSUBSCRIBE: &str = "pusher:unsubscribe";
/// Client → server: keepalive ping.
pub const EVENT_PING: &str = "pusher:ping";
/// Server → client: keepalive reply.
pub const EVENT_PONG: &str = "pusher:pong";
/// Server → client: in-band error.
pub const EVENT_ERROR: &str = "pusher:error";
/// Server → client: subscription acknowledged.
pub const EVENT_SUBSCRIPTION_SUCCEEDED: &str = "pusher_internal:subscription_succeeded";
/// Server → client: a member joined a presence channel.
pub const EVENT_MEMBER_ADDED: &str = "pusher_internal:member_added";
/// Server → client: a member left a presence channel.
pub const EVENT_MEMBER_REMOVED: &str = "pusher_internal:member_removed";

#[derive(Serialize)]
struct Frame<'a, D: Serialize> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    data: D,
}

fn serialize<D: Serialize>(frame: &Frame<'_, D>) -> String {
    serde_json::to_string(frame).unwrap_or_default()
}

/// `pusher:error` with a human-readable message.
pub fn error(message: &str) -> String {
    serialize(&Frame {
        event: EVENT_ERROR,
        channel: None,
        data: serde_json::json!({ "message": message }),
    })
}

/// `pusher:pong` reply.
pub fn pong() -> String {
    serialize(&Frame {
        event: EVENT_PONG,
        channel: None,
        data: serde_json::json!({}),
    })
}

/// `pusher_internal:subscription_succeeded` carrying the given payload
/// (presence data for presence channels, an empty object otherwise).
pub fn subscription_succeeded(channel: &str, data: &Value) -> String {
    serialize(&Frame {
        event: EVENT_SUBSCRIPTION_SUCCEEDED,
        channel: Some(channel),
        data,
    })
}

/// `pusher_internal:member_added` announcing a new presence member.
pub fn member_added(channel: &str, user_id: &str, user_info: &Value) -> String {
    serialize(&Frame {
        event: EVENT_MEMBER_ADDED,
        channel: Some(channel),
        data: serde_json::json!({ "user_id": user_id, "user_info": user_info }),
    })
}

/// `pusher_internal:member_removed` announcing a departed presence member.
pub fn member_removed(channel: &str, user_id: &str) -> String {
    serialize(&Frame {
        event: EVENT_MEMBER_REMOVED,
        channel: Some(channel),
        data: serde_json::json!({ "user_id": user_id }),
    })
}

/// A client event re-emitted verbatim: the `data` blob is the sender's bytes.
pub fn client_event(event: &str, channel: &str, data: &RawValue) -> String {
    serialize(&Frame {
        event,
        channel: Some(channel),
        data,
    })
}

/// A server-initiated event on a channel.
pub fn server_event(event: &str, channel: &str, data: &Value) -> String {
    serialize(&Frame {
        event,
        channel: Some(channel),
        data,
    })
}
