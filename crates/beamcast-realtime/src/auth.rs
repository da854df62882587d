//! Channel authorization tokens.
//!
//! A token is `"<socket_id>:<hex-hmac-sha256>"` where the signature covers
//! `"<socket_id>:<channel_name>"` under the shared secret. Binding the token
//! to the socket id makes a captured token unusable on any other connection.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Deterministic signer/verifier for channel authorization tokens.
#[derive(Debug, Clone)]
pub struct ChannelAuth {
    secret: Vec<u8>,
}

impl ChannelAuth {
    /// Creates a signer over the given shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Computes the hex HMAC-SHA256 signature for a socket/channel pair.
    pub fn sign(&self, socket_id: &str, channel_name: &str) -> String {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC accepts any key length");
        mac.update(socket_id.as_bytes());
        mac.update(b":");
        mac.update(channel_name.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Builds the full authorization token for a socket/channel pair.
    pub fn token(&self, socket_id: &str, channel_name: &str) -> String {
        format!("{}:{}", socket_id, self.sign(socket_id, channel_name))
    }

    /// Verifies a token against the expected socket id and channel name.
    ///
    /// Returns `false` on any parse error or mismatch; never panics. The
    /// signature comparison is constant-time over the hex bytes.
    pub fn verify(&self, token: &str, expected_socket_id: &str, channel_name: &str) -> bool {
        let Some((socket_id, signature)) = token.split_once(':') else {
            return false;
        };
        if socket_id != expected_socket_id {
            return false;
        }
        let expected = self.sign(expected_socket_id, channel_name);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}
