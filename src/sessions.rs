//! Per-raffle subscriber sets for joined websocket connections.
//!
//! Every connection owns an unbounded outbox drained by its socket task.
//! Broadcasts snapshot the recipients under a read lock and send after
//! releasing it, so joins and leaves never block on delivery. A send that
//! fails means the socket task is gone; that connection is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::protocol::ServerMessage;
use crate::types::{ConnectionId, RaffleId};

/// Sending half of a connection's message queue
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Default)]
struct Registry {
    subscribers: HashMap<RaffleId, HashMap<ConnectionId, Outbox>>,
    memberships: HashMap<ConnectionId, RaffleId>,
}

impl Registry {
    fn remove(&mut self, conn_id: &ConnectionId) -> Option<RaffleId> {
        let raffle_id = self.memberships.remove(conn_id)?;
        if let Some(set) = self.subscribers.get_mut(&raffle_id) {
            set.remove(conn_id);
            if set.is_empty() {
                self.subscribers.remove(&raffle_id);
            }
        }
        Some(raffle_id)
    }
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `conn_id` to `raffle_id` and queue `initial` for it.
    ///
    /// `initial` is queued while the registry is locked, so it precedes any
    /// broadcast the connection receives. Re-registering moves the connection
    /// off any raffle it was on before.
    pub async fn register(
        &self,
        raffle_id: &RaffleId,
        conn_id: ConnectionId,
        outbox: Outbox,
        initial: ServerMessage,
    ) {
        let mut registry = self.inner.write().await;
        registry.remove(&conn_id);

        if outbox.send(initial).is_err() {
            tracing::debug!(%conn_id, "Connection closed before registration");
            return;
        }

        registry
            .subscribers
            .entry(raffle_id.clone())
            .or_default()
            .insert(conn_id, outbox);
        registry.memberships.insert(conn_id, raffle_id.clone());
    }

    /// Remove a connection from whichever raffle it joined. No-op when unknown.
    pub async fn unregister(&self, conn_id: &ConnectionId) -> Option<RaffleId> {
        self.inner.write().await.remove(conn_id)
    }

    /// Deliver `msg` to every subscriber of `raffle_id`; returns how many accepted it
    pub async fn broadcast(&self, raffle_id: &RaffleId, msg: ServerMessage) -> usize {
        let recipients: Vec<(ConnectionId, Outbox)> = {
            let registry = self.inner.read().await;
            match registry.subscribers.get(raffle_id) {
                Some(set) => set.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for (conn_id, outbox) in recipients {
            if outbox.send(msg.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(conn_id);
            }
        }

        if !dead.is_empty() {
            let mut registry = self.inner.write().await;
            for conn_id in &dead {
                tracing::warn!(%conn_id, raffle_id = %raffle_id, "Dropping unreachable subscriber");
                registry.remove(conn_id);
            }
        }

        delivered
    }

    pub async fn subscriber_count(&self, raffle_id: &RaffleId) -> usize {
        self.inner
            .read()
            .await
            .subscribers
            .get(raffle_id)
            .map_or(0, |set| set.len())
    }

    /// Raffle a connection is currently subscribed to
    pub async fn membership(&self, conn_id: &ConnectionId) -> Option<RaffleId> {
        self.inner.read().await.memberships.get(conn_id).cloned()
    }
}
