use super::{AppState, RaffleSlot};
use crate::auth;
use crate::error::{RaffleError, RaffleResult};
use crate::protocol::ServerMessage;
use crate::sessions::Outbox;
use crate::tickets;
use crate::types::*;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Generate an opaque 128-bit access token
fn generate_token() -> Token {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

fn default_name(raffle_id: &str) -> String {
    let short: String = raffle_id.chars().take(6).collect();
    format!("Raffle {}", short)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl RaffleRecord {
    /// Fresh record with new tokens and shuffled tickets
    fn create(id: RaffleId, req: UpsertRaffle, now: &str) -> Self {
        let ticket_fingerprint = tickets::fingerprint(&req.tickets);
        let mut shuffled = req.tickets;
        tickets::shuffle(&mut shuffled);

        Self {
            name: non_blank(req.name).unwrap_or_else(|| default_name(&id)),
            id,
            created_at: non_blank(req.created_at).unwrap_or_else(|| now.to_string()),
            updated_at: now.to_string(),
            settings: req.settings.unwrap_or_else(|| serde_json::json!({})),
            participants: req.participants.unwrap_or_else(|| serde_json::json!([])),
            tickets: shuffled,
            ticket_fingerprint,
            host_token: generate_token(),
            viewer_token: generate_token(),
            winner_name: None,
            rotation: 0.0,
        }
    }

    /// Apply an upsert to an existing record. Tokens never change.
    ///
    /// Returns true when the ticket multiset changed, in which case the wedges
    /// are reshuffled and the previous spin result is discarded.
    fn apply_upsert(&mut self, req: UpsertRaffle, now: &str) -> bool {
        let incoming = tickets::fingerprint(&req.tickets);
        let reshuffle = tickets::should_reshuffle(Some(self.ticket_fingerprint.as_str()), &incoming);

        if reshuffle {
            let mut shuffled = req.tickets;
            tickets::shuffle(&mut shuffled);
            self.tickets = shuffled;
            self.ticket_fingerprint = incoming;
            self.winner_name = None;
            self.rotation = 0.0;
        }

        self.name = non_blank(req.name).unwrap_or_else(|| default_name(&self.id));
        if let Some(created_at) = non_blank(req.created_at) {
            self.created_at = created_at;
        }
        self.settings = req.settings.unwrap_or_else(|| serde_json::json!({}));
        self.participants = req.participants.unwrap_or_else(|| serde_json::json!([]));
        self.updated_at = now.to_string();

        reshuffle
    }
}

impl AppState {
    /// Look up the slot for a raffle
    pub async fn raffle_slot(&self, raffle_id: &str) -> RaffleResult<RaffleSlot> {
        self.raffles
            .read()
            .await
            .get(raffle_id)
            .cloned()
            .ok_or(RaffleError::NotFound)
    }

    /// Create a raffle, or update the one with the given id
    pub async fn upsert_raffle(&self, req: UpsertRaffle) -> RaffleRecord {
        let now = chrono::Utc::now().to_rfc3339();
        let raffle_id = non_blank(req.raffle_id.clone())
            .unwrap_or_else(|| ulid::Ulid::new().to_string());

        let slot = {
            let mut raffles = self.raffles.write().await;
            if let Some(slot) = raffles.get(&raffle_id).cloned() {
                slot
            } else {
                let record = RaffleRecord::create(raffle_id.clone(), req, &now);
                tracing::info!(
                    raffle_id = %raffle_id,
                    tickets = record.tickets.len(),
                    "Raffle created"
                );
                raffles.insert(raffle_id, Arc::new(Mutex::new(record.clone())));
                drop(raffles);
                self.schedule_save();
                return record;
            }
        };

        let record = {
            let mut record = slot.lock().await;
            let reshuffled = record.apply_upsert(req, &now);
            tracing::info!(
                raffle_id = %record.id,
                tickets = record.tickets.len(),
                reshuffled,
                "Raffle updated"
            );
            self.publish_state(&record).await;
            record.clone()
        };

        self.schedule_save();
        record
    }

    /// Public projection of a raffle for a holder of either token
    pub async fn get_raffle(&self, raffle_id: &str, token: Option<&str>) -> RaffleResult<RaffleView> {
        let slot = self.raffle_slot(raffle_id).await?;
        let record = slot.lock().await;
        auth::authorize_read(&record, token)?;
        Ok(record.view())
    }

    /// Authenticate a connection and subscribe it to the raffle.
    ///
    /// The `state` snapshot is queued on `outbox` before any later broadcast.
    pub async fn join_raffle(
        &self,
        raffle_id: &str,
        token: &str,
        requested: Role,
        conn_id: ConnectionId,
        outbox: Outbox,
    ) -> RaffleResult<Role> {
        let slot = self.raffle_slot(raffle_id).await?;
        let record = slot.lock().await;
        let role = auth::authorize(&record, token, requested)?;

        self.sessions
            .register(&record.id, conn_id, outbox, ServerMessage::State(record.view()))
            .await;

        tracing::info!(raffle_id = %record.id, %conn_id, ?role, "Connection joined raffle");
        Ok(role)
    }

    /// Send the current projection to every subscriber of the raffle
    pub async fn broadcast_state(&self, raffle_id: &str) -> RaffleResult<usize> {
        let slot = self.raffle_slot(raffle_id).await?;
        let record = slot.lock().await;
        Ok(self.publish_state(&record).await)
    }

    /// Caller holds the record's lock, which keeps broadcasts in mutation order
    async fn publish_state(&self, record: &RaffleRecord) -> usize {
        self.sessions
            .broadcast(&record.id, ServerMessage::Updated(record.view()))
            .await
    }
}
