use super::AppState;
use crate::error::RaffleResult;
use crate::types::RaffleRecord;
use std::sync::atomic::Ordering;

impl AppState {
    /// Coalesce mutations into one snapshot write after the debounce window
    pub fn schedule_save(&self) {
        if self.save_pending.swap(true, Ordering::SeqCst) {
            return;
        }

        let state = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(state.config.save_debounce).await;
            state.save_pending.store(false, Ordering::SeqCst);
            if let Err(e) = state.save_now().await {
                tracing::error!("Failed to save raffle snapshot: {}", e);
            }
        });
    }

    /// Consistent copy of every record, ordered by id
    pub async fn snapshot(&self) -> Vec<RaffleRecord> {
        let slots: Vec<_> = self.raffles.read().await.values().cloned().collect();

        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            records.push(slot.lock().await.clone());
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Write a snapshot immediately
    pub async fn save_now(&self) -> RaffleResult<()> {
        let _guard = self.save_lock.lock().await;
        let records = self.snapshot().await;
        self.store.save(&records).await?;
        tracing::info!(count = records.len(), "Saved raffle snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::persistence::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
    use crate::types::UpsertRaffle;
    use std::sync::Arc;
    use std::time::Duration;

    fn quick_config() -> ServerConfig {
        ServerConfig {
            save_debounce: Duration::from_millis(50),
            ..Default::default()
        }
    }

    fn tickets(names: &[&str]) -> UpsertRaffle {
        UpsertRaffle {
            tickets: names.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_burst_of_mutations_saves_once() {
        let store = MemorySnapshotStore::new();
        let state = AppState::new(quick_config(), Arc::new(store.clone()));

        for _ in 0..10 {
            state.upsert_raffle(tickets(&["A", "B"])).await;
        }
        assert_eq!(store.save_count(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.records().await.len(), 10);

        state.upsert_raffle(tickets(&["C"])).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.records().await.len(), 11);
    }

    #[tokio::test]
    async fn test_snapshot_is_sorted_by_id() {
        let state = AppState::default();
        for id in ["c", "a", "b"] {
            state
                .upsert_raffle(UpsertRaffle {
                    raffle_id: Some(id.to_string()),
                    ..Default::default()
                })
                .await;
        }

        let ids: Vec<_> = state.snapshot().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_file_snapshot_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raffles.json");

        let state = AppState::new(quick_config(), Arc::new(FileSnapshotStore::new(&path)));
        let record = state.upsert_raffle(tickets(&["A", "A", "B"])).await;
        let spin = state
            .spin_raffle(&record.id, crate::types::Role::Host)
            .await
            .unwrap();
        state.save_now().await.unwrap();

        let restored =
            AppState::load(quick_config(), Arc::new(FileSnapshotStore::new(&path))).await;
        let slot = restored.raffle_slot(&record.id).await.unwrap();
        let stored = slot.lock().await;
        assert_eq!(stored.host_token, record.host_token);
        assert_eq!(stored.viewer_token, record.viewer_token);
        assert_eq!(stored.tickets, record.tickets);
        assert_eq!(stored.rotation, spin.rotation);
        assert_eq!(stored.winner_name.as_deref(), Some(spin.winner_name.as_str()));
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("raffles.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let store = FileSnapshotStore::new(&path);
        let state = AppState::new(quick_config(), Arc::new(store.clone()));
        state.upsert_raffle(tickets(&["A"])).await;

        assert!(state.save_now().await.is_err());
        assert!(store.load().await.is_err());
    }
}
