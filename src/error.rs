//! Error taxonomy shared by the websocket channel and the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::persistence::SnapshotError;
use crate::protocol::ServerMessage;

pub type RaffleResult<T> = Result<T, RaffleError>;

#[derive(Debug, thiserror::Error)]
pub enum RaffleError {
    #[error("Raffle not found.")]
    NotFound,

    /// Token matches neither role secret. Deliberately says nothing about which was expected.
    #[error("Token rejected.")]
    Forbidden,

    #[error("{0}")]
    RoleRejected(&'static str),

    #[error("Join a raffle first.")]
    NotJoined,

    #[error("Invalid message: {0}")]
    MalformedMessage(String),

    #[error("No tickets to spin.")]
    EmptyTicketPool,

    #[error("Failed to save raffles: {0}")]
    Persistence(#[from] SnapshotError),
}

impl RaffleError {
    /// Stable code sent alongside the human-readable message
    pub fn code(&self) -> &'static str {
        match self {
            RaffleError::NotFound => "NOT_FOUND",
            RaffleError::Forbidden => "FORBIDDEN",
            RaffleError::RoleRejected(_) => "ROLE_REJECTED",
            RaffleError::NotJoined => "NOT_JOINED",
            RaffleError::MalformedMessage(_) => "MALFORMED_MESSAGE",
            RaffleError::EmptyTicketPool => "EMPTY_TICKET_POOL",
            RaffleError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RaffleError::NotFound => StatusCode::NOT_FOUND,
            RaffleError::Forbidden | RaffleError::RoleRejected(_) => StatusCode::FORBIDDEN,
            RaffleError::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            RaffleError::NotJoined | RaffleError::EmptyTicketPool => StatusCode::CONFLICT,
            RaffleError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error frame for the offending websocket connection
    pub fn to_server_message(&self) -> ServerMessage {
        ServerMessage::Error {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for RaffleError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}
