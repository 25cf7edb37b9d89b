use super::AppState;
use crate::error::{RaffleError, RaffleResult};
use crate::protocol::ServerMessage;
use crate::types::{RaffleId, Role, SpinResult};

impl AppState {
    /// Draw a winner for the raffle and broadcast the result to its subscribers.
    ///
    /// Spins on one raffle are serialized by its lock, so each starts from the
    /// rotation the previous one stored.
    pub async fn spin_raffle(&self, raffle_id: &str, role: Role) -> RaffleResult<SpinResult> {
        if role != Role::Host {
            return Err(RaffleError::RoleRejected("Only the host can spin."));
        }

        let slot = self.raffle_slot(raffle_id).await?;
        let result = {
            let mut record = slot.lock().await;
            let result = crate::spin::spin(&record.tickets, record.rotation)
                .ok_or(RaffleError::EmptyTicketPool)?;

            record.rotation = result.rotation;
            record.winner_name = Some(result.winner_name.clone());
            record.updated_at = chrono::Utc::now().to_rfc3339();

            let delivered = self.broadcast_spin(&record.id, &result).await;
            tracing::info!(
                raffle_id = %record.id,
                winner = %result.winner_name,
                winner_index = result.winner_index,
                delivered,
                "Wheel spun"
            );
            result
        };

        self.schedule_save();
        Ok(result)
    }

    /// Send a spin outcome to every subscriber of the raffle
    pub async fn broadcast_spin(&self, raffle_id: &RaffleId, result: &SpinResult) -> usize {
        self.sessions
            .broadcast(raffle_id, ServerMessage::Spin(result.clone()))
            .await
    }
}
