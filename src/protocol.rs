use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Authenticate against a raffle and subscribe to its updates
    Join {
        raffle_id: RaffleId,
        token: Token,
        #[serde(default)]
        role: Option<String>,
    },
    /// Host-only: spin the joined raffle
    Spin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Full snapshot, sent once after a successful join
    State(RaffleView),
    /// Sent to all subscribers after an upsert
    Updated(RaffleView),
    /// Sent to all subscribers after a spin
    Spin(SpinResult),
    Error { code: String, message: String },
}
