//! Connection identity, handles, and the live connection table.

pub mod handle;
pub mod id;
pub mod pool;

pub use handle::{ConnectionHandle, WsCommand};
pub use id::SocketId;
pub use pool::ConnectionPool;
