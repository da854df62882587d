//! Presence member records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `(user_id, user_info)` record associated with one subscribing
/// connection on a presence channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceMember {
    /// User identifier supplied by the subscriber.
    pub user_id: String,
    /// Opaque user metadata.
    pub user_info: Value,
}

/// Deserialization target for the `channel_data` field of a presence
/// subscribe request.
#[derive(Debug, Deserialize)]
struct ChannelData {
    user_id: Option<Value>,
    user_info: Option<Value>,
}

impl PresenceMember {
    /// Builds a member from the subscribe request's `channel_data`.
    ///
    /// A missing `channel_data` or missing `user_id` falls back to the
    /// connection id; a missing `user_info` defaults to an empty object.
    /// Malformed JSON is an error (the caller rolls the subscription back).
    pub fn from_channel_data(
        channel_data: Option<&str>,
        fallback_user_id: &str,
    ) -> Result<Self, serde_json::Error> {
        let Some(raw) = channel_data else {
            return Ok(Self::anonymous(fallback_user_id));
        };

        let parsed: ChannelData = serde_json::from_str(raw)?;
        let user_id = match parsed.user_id {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => fallback_user_id.to_string(),
        };
        let user_info = match parsed.user_info {
            Some(info) => info,
            None => Value::Object(serde_json::Map::new()),
        };
        Ok(Self { user_id, user_info })
    }

    /// Member with no supplied metadata, identified by the connection id.
    fn anonymous(fallback_user_id: &str) -> Self {
        Self {
            user_id: fallback_user_id.to_string(),
            user_info: Value::Object(serde_json::Map::new()),
        }
    }
}
