//! WebSocket message dispatch
//!
//! Each connection carries at most one raffle membership. Errors go back to
//! the offending connection only; nothing here ever closes the socket.

use crate::error::RaffleError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::sessions::Outbox;
use crate::state::AppState;
use crate::types::{ConnectionId, RaffleId, Role};
use std::sync::Arc;

/// Per-socket session state
pub struct Connection {
    pub id: ConnectionId,
    pub outbox: Outbox,
    /// Raffle and role granted by the last successful join
    pub raffle: Option<(RaffleId, Role)>,
}

impl Connection {
    pub fn new(outbox: Outbox) -> Self {
        Self {
            id: ulid::Ulid::new(),
            outbox,
            raffle: None,
        }
    }
}

/// Handle a client message and return an optional direct reply.
///
/// Successful joins and spins reply through the raffle's subscriber set, so
/// they return `None`.
pub async fn handle_message(
    msg: ClientMessage,
    conn: &mut Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join {
            raffle_id,
            token,
            role,
        } => {
            let requested = Role::from_requested(role.as_deref());
            match state
                .join_raffle(&raffle_id, &token, requested, conn.id, conn.outbox.clone())
                .await
            {
                Ok(role) => {
                    conn.raffle = Some((raffle_id, role));
                    None
                }
                Err(e) => {
                    tracing::warn!(conn_id = %conn.id, raffle_id = %raffle_id, "Join rejected: {}", e);
                    Some(e.to_server_message())
                }
            }
        }

        ClientMessage::Spin => {
            let Some((raffle_id, role)) = conn.raffle.clone() else {
                return Some(RaffleError::NotJoined.to_server_message());
            };
            match state.spin_raffle(&raffle_id, role).await {
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(conn_id = %conn.id, raffle_id = %raffle_id, "Spin rejected: {}", e);
                    Some(e.to_server_message())
                }
            }
        }
    }
}

/// Parse a raw text frame and dispatch it
pub async fn handle_text(
    text: &str,
    conn: &mut Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => handle_message(msg, conn, state).await,
        Err(e) => {
            tracing::debug!(conn_id = %conn.id, "Failed to parse client message: {}", e);
            Some(RaffleError::MalformedMessage(e.to_string()).to_server_message())
        }
    }
}
