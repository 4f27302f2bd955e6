//! Registry of live interview connections.
//!
//! The registry holds only connection metadata (id, accept time, cancellation
//! token) for admission control, listing, and shutdown. Interview state never
//! lives here; each [`crate::interview::Session`] is owned by its connection
//! task.
//!
//! # Thread Safety
//!
//! - `ConnectionRegistry` uses `DashMap` for lock-free concurrent access
//! - Slots are claimed with a compare-and-swap on an atomic counter, so
//!   concurrent upgrades never exceed `max_connections`
//! - Each connection's token is a child of the server shutdown token, so
//!   cancelling the server ends every interview

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::types::ConnectionInfo;
use crate::error::{InterviewError, Result};

/// Default cap on concurrent interviews.
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Metadata for one live connection.
#[derive(Debug)]
pub struct Connection {
    pub id: Uuid,
    /// Cancelled when the connection should end (server shutdown or kick).
    pub cancel_token: CancellationToken,
    pub created_at: Instant,
}

pub struct ConnectionRegistry {
    connections: DashMap<Uuid, Arc<Connection>>,
    /// Claimed slots; incremented before insert, decremented after remove.
    active: AtomicUsize,
    shutdown_token: CancellationToken,
    pub max_connections: usize,
}

impl ConnectionRegistry {
    pub fn new(max_connections: usize, shutdown_token: CancellationToken) -> Self {
        Self {
            connections: DashMap::new(),
            active: AtomicUsize::new(0),
            shutdown_token,
            max_connections,
        }
    }

    /// Reserve a slot for a new connection.
    ///
    /// The returned guard removes the entry when dropped.
    pub fn register(&self) -> Result<ConnectionGuard<'_>> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |active| {
                (active < self.max_connections).then_some(active + 1)
            })
            .map_err(|_| InterviewError::ConnectionLimit(self.max_connections))?;

        let connection = Arc::new(Connection {
            id: Uuid::new_v4(),
            cancel_token: self.shutdown_token.child_token(),
            created_at: Instant::now(),
        });
        self.connections.insert(connection.id, connection.clone());
        Ok(ConnectionGuard {
            registry: self,
            connection,
        })
    }

    /// Whether a new connection would currently be admitted.
    pub fn has_capacity(&self) -> bool {
        self.active.load(Ordering::Acquire) < self.max_connections
    }

    /// Cancel a connection, ending its interview. Returns false if unknown.
    pub fn cancel(&self, id: &Uuid) -> bool {
        match self.connections.get(id) {
            Some(entry) => {
                entry.cancel_token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }

    pub fn list(&self) -> Vec<ConnectionInfo> {
        self.connections
            .iter()
            .map(|entry| ConnectionInfo {
                id: entry.key().to_string(),
                connected_ms: entry.value().created_at.elapsed().as_millis() as u64,
            })
            .collect()
    }

    fn remove(&self, id: &Uuid) {
        if self.connections.remove(id).is_some() {
            self.active.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Keeps a connection registered for as long as it is alive.
pub struct ConnectionGuard<'a> {
    registry: &'a ConnectionRegistry,
    connection: Arc<Connection>,
}

impl ConnectionGuard<'_> {
    pub fn id(&self) -> Uuid {
        self.connection.id
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.connection.cancel_token.clone()
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove(&self.connection.id);
    }
}
