//! Connection table — all live connections indexed by socket id.

use std::sync::Arc;

use dashmap::DashMap;

use super::handle::ConnectionHandle;
use super::id::SocketId;

/// Thread-safe table of all live WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    by_id: DashMap<SocketId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
        }
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id.clone(), handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &SocketId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Gets a connection by id. Fan-out callers must tolerate `None`: a
    /// connection may disappear between snapshot and send.
    pub fn get(&self, conn_id: &SocketId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Snapshot of all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
