//! Durable snapshot of every raffle record.
//!
//! A snapshot is one JSON array holding all records, tokens and fingerprints
//! included. It is always rewritten wholesale and reloaded wholesale at startup.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::types::RaffleRecord;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage backend for raffle snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the last written snapshot. An absent snapshot is an empty list.
    async fn load(&self) -> Result<Vec<RaffleRecord>, SnapshotError>;

    /// Replace the snapshot with `records`
    async fn save(&self, records: &[RaffleRecord]) -> Result<(), SnapshotError>;
}

/// Load a snapshot, treating any failure as an empty registry
pub async fn load_or_empty(store: &dyn SnapshotStore) -> Vec<RaffleRecord> {
    match store.load().await {
        Ok(records) => {
            tracing::info!(count = records.len(), "Loaded raffle snapshot");
            records
        }
        Err(e) => {
            tracing::warn!("Failed to load raffle snapshot, starting empty: {}", e);
            Vec::new()
        }
    }
}

/// Pretty-printed JSON file, replaced atomically via a sibling temp file
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "raffles.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Vec<RaffleRecord>, SnapshotError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, records: &[RaffleRecord]) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Keeps the last snapshot in memory. Used when disk persistence is disabled.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    records: Arc<Mutex<Vec<RaffleRecord>>>,
    saves: Arc<std::sync::atomic::AtomicUsize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed saves
    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub async fn records(&self) -> Vec<RaffleRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Vec<RaffleRecord>, SnapshotError> {
        Ok(self.records.lock().await.clone())
    }

    async fn save(&self, records: &[RaffleRecord]) -> Result<(), SnapshotError> {
        *self.records.lock().await = records.to_vec();
        self.saves.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> RaffleRecord {
        RaffleRecord {
            id: id.to_string(),
            name: format!("Raffle {}", id),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
            settings: serde_json::json!({ "ticketCost": 5000 }),
            participants: serde_json::json!([{ "name": "A", "paidTickets": 2 }]),
            tickets: vec!["A".to_string(), "A".to_string()],
            ticket_fingerprint: "fp".to_string(),
            host_token: "h".to_string(),
            viewer_token: "v".to_string(),
            winner_name: Some("A".to_string()),
            rotation: 12.5,
        }
    }

    #[tokio::test]
    async fn test_file_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested/raffles.json"));

        store.save(&[record("r1"), record("r2")]).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], record("r1"));
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_file_store_writes_camel_case_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("raffles.json"));
        store.save(&[record("r1")]).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["hostToken"], "h");
        assert_eq!(json[0]["ticketFingerprint"], "fp");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raffles.json");
        std::fs::write(&path, "{ not json ]").unwrap();

        let store = FileSnapshotStore::new(&path);
        assert!(matches!(store.load().await, Err(SnapshotError::Json(_))));
        assert!(load_or_empty(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemorySnapshotStore::new();
        store.save(&[record("r1")]).await.unwrap();
        store.save(&[]).await.unwrap();
        assert_eq!(store.save_count(), 2);
        assert!(store.records().await.is_empty());
    }
}
