//! Inbound message envelope and decoding.

use serde::Deserialize;
use serde_json::value::RawValue;
use thiserror::Error;

use crate::channel::name::MAX_CHANNEL_NAME_LENGTH;

/// Maximum accepted inbound frame size in bytes.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Maximum accepted event name length.
pub const MAX_EVENT_NAME_LENGTH: usize = 200;

/// The JSON envelope carried by every inbound text frame.
///
/// `data` stays an unparsed blob so client events can be re-emitted verbatim
/// during fan-out without a decode/encode round trip.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    /// Event name; reserved `pusher:` names route to protocol handlers,
    /// anything else is a client event.
    pub event: String,
    /// Opaque payload.
    pub data: Option<Box<RawValue>>,
    /// Target channel.
    pub channel: Option<String>,
    /// Authorization token for private/presence subscribes.
    pub auth: Option<String>,
    /// JSON-encoded presence member info.
    pub channel_data: Option<String>,
}

/// Decode failures. The display strings are the exact in-band error messages
/// sent back to the peer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Not valid JSON, or missing required fields.
    #[error("Invalid JSON format")]
    InvalidJson,
    /// Frame exceeds [`MAX_FRAME_BYTES`].
    #[error("Message too large")]
    TooLarge,
    /// Event name empty or over [`MAX_EVENT_NAME_LENGTH`].
    #[error("Invalid event name")]
    InvalidEvent,
    /// Channel name over the length cap.
    #[error("Invalid channel name")]
    InvalidChannel,
}

impl Envelope {
    /// Decodes and bounds-checks a raw text frame.
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        if raw.len() > MAX_FRAME_BYTES {
            return Err(CodecError::TooLarge);
        }
        let envelope: Envelope =
            serde_json::from_str(raw).map_err(|_| CodecError::InvalidJson)?;
        if envelope.event.is_empty() || envelope.event.len() > MAX_EVENT_NAME_LENGTH {
            return Err(CodecError::InvalidEvent);
        }
        if let Some(channel) = &envelope.channel {
            if channel.len() > MAX_CHANNEL_NAME_LENGTH {
                return Err(CodecError::InvalidChannel);
            }
        }
        Ok(envelope)
    }
}
