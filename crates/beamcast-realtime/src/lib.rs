//! Pusher-compatible realtime pub/sub engine for beamcast.
//!
//! Provides:
//! - WebSocket connection lifecycle and per-connection dispatch
//! - Prefix-typed pub/sub channels (`public-`, `private-`, `presence-`)
//! - Presence membership tracking with join/leave broadcasts
//! - HMAC-SHA256 channel authorization bound to the socket id
//! - Admission control: per-IP connection caps, per-connection channel caps,
//!   fixed-window message rates

pub mod auth;
pub mod channel;
pub mod connection;
pub mod dispatch;
pub mod limits;
pub mod message;
pub mod metrics;
pub mod presence;
pub mod server;

pub use server::RealtimeEngine;
