//! Wire message codec: inbound envelope decoding and outbound frame builders.

pub mod envelope;
pub mod events;

pub use envelope::{CodecError, Envelope};
