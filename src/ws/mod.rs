pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{
    sink::{Sink, SinkExt},
    stream::StreamExt,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::protocol::ServerMessage;
use crate::state::AppState;
use handlers::Connection;

/// WebSocket upgrade handler. Authentication happens later, with the `join` message.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            None
        }
    }
}

/// A client that has not accepted a frame within this window is disconnected
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Write one frame, giving up after `limit`. Returns false when the connection should close.
async fn send_frame<S>(sender: &mut S, frame: Message, limit: Duration) -> bool
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    match tokio::time::timeout(limit, sender.send(frame)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!("WebSocket send failed: {}", e);
            false
        }
        Err(_) => {
            tracing::warn!("WebSocket send timed out after {:?}, dropping client", limit);
            false
        }
    }
}

/// Drive one connection: drain its outbox into the socket and dispatch inbound frames
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut conn = Connection::new(tx);

    tracing::info!(conn_id = %conn.id, "WebSocket connected");

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                // The connection holds a sender itself, so the channel never closes here
                let Some(msg) = outgoing else { break };
                if let Some(frame) = encode(&msg) {
                    if !send_frame(&mut sender, frame, SEND_TIMEOUT).await {
                        break;
                    }
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(conn_id = %conn.id, len = text.len(), "Received message");
                        if let Some(reply) = handlers::handle_text(text.as_str(), &mut conn, &state).await {
                            // Through the outbox so replies stay ordered with broadcasts
                            let _ = conn.outbox.send(reply);
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if !send_frame(&mut sender, Message::Pong(data), SEND_TIMEOUT).await {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!(conn_id = %conn.id, "WebSocket closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(conn_id = %conn.id, "WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if let Some(raffle_id) = state.sessions.unregister(&conn.id).await {
        tracing::debug!(conn_id = %conn.id, raffle_id = %raffle_id, "Left raffle");
    }
    tracing::info!(conn_id = %conn.id, "WebSocket connection closed");
}
