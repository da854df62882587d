//! Channel name classification and validation.

use serde::{Deserialize, Serialize};

/// Maximum accepted channel name length.
pub const MAX_CHANNEL_NAME_LENGTH: usize = 200;

/// Channel type, derived from the name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Open to any connection.
    Public,
    /// Requires a signed authorization token to subscribe.
    Private,
    /// Requires authorization and tracks member presence.
    Presence,
}

impl ChannelKind {
    /// Derives the channel type from its name prefix.
    pub fn of(name: &str) -> Self {
        if name.starts_with("presence-") {
            ChannelKind::Presence
        } else if name.starts_with("private-") {
            ChannelKind::Private
        } else {
            ChannelKind::Public
        }
    }

    /// Whether subscribing requires a signed authorization token.
    pub fn requires_auth(self) -> bool {
        matches!(self, ChannelKind::Private | ChannelKind::Presence)
    }

    /// Canonical lowercase name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Public => "public",
            ChannelKind::Private => "private",
            ChannelKind::Presence => "presence",
        }
    }
}

/// Validates a channel name: a `public-`/`private-`/`presence-` prefix
/// followed by at least one `[A-Za-z0-9_-]` character, total length capped.
pub fn is_valid(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_CHANNEL_NAME_LENGTH {
        return false;
    }
    let suffix = name
        .strip_prefix("public-")
        .or_else(|| name.strip_prefix("private-"))
        .or_else(|| name.strip_prefix("presence-"));
    match suffix {
        Some(rest) => {
            !rest.is_empty()
                && rest
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        }
        None => false,
    }
}
