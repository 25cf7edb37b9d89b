use serde::{Deserialize, Serialize};

/// Opaque ID types
pub type RaffleId = String;
pub type Token = String;
pub type ConnectionId = ulid::Ulid;

/// Role a connection holds once it has joined a raffle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Viewer,
}

impl Role {
    /// Anything other than an explicit `host` request is treated as a viewer.
    pub fn from_requested(role: Option<&str>) -> Self {
        match role {
            Some("host") => Role::Host,
            _ => Role::Viewer,
        }
    }
}

/// A raffle as stored and persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaffleRecord {
    pub id: RaffleId,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    /// Pass-through payload from the uploading client
    #[serde(default)]
    pub settings: serde_json::Value,
    /// Pass-through payload from the uploading client
    #[serde(default)]
    pub participants: serde_json::Value,
    /// One entry per ticket, in wedge order
    #[serde(default)]
    pub tickets: Vec<String>,
    #[serde(default)]
    pub ticket_fingerprint: String,
    pub host_token: Token,
    pub viewer_token: Token,
    #[serde(default)]
    pub winner_name: Option<String>,
    /// Cumulative wheel rotation in radians
    #[serde(default)]
    pub rotation: f64,
}

impl RaffleRecord {
    pub fn view(&self) -> RaffleView {
        RaffleView::from(self)
    }
}

/// Public projection of a raffle, safe to send to any joined connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaffleView {
    pub raffle_id: RaffleId,
    pub name: String,
    pub tickets: Vec<String>,
    pub rotation: f64,
    pub winner_name: Option<String>,
}

impl From<&RaffleRecord> for RaffleView {
    fn from(r: &RaffleRecord) -> Self {
        Self {
            raffle_id: r.id.clone(),
            name: r.name.clone(),
            tickets: r.tickets.clone(),
            rotation: r.rotation,
            winner_name: r.winner_name.clone(),
        }
    }
}

/// Outcome of a spin, broadcast verbatim to every subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpinResult {
    pub winner_index: usize,
    pub winner_name: String,
    pub rotation: f64,
    pub duration_ms: u64,
}

/// Create-or-update payload accepted from the uploading client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRaffle {
    #[serde(default)]
    pub raffle_id: Option<RaffleId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    #[serde(default)]
    pub participants: Option<serde_json::Value>,
    #[serde(default)]
    pub tickets: Vec<String>,
}
