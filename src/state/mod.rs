mod persist;
mod raffle;
mod spin;

use crate::config::ServerConfig;
use crate::persistence::{self, MemorySnapshotStore, SnapshotStore};
use crate::sessions::SessionRegistry;
use crate::types::*;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// One raffle behind its own mutation lock
pub type RaffleSlot = Arc<Mutex<RaffleRecord>>;

/// Shared application state
///
/// Lock order is always map -> raffle slot -> session registry. The map lock is
/// only held long enough to look up or insert a slot.
#[derive(Clone)]
pub struct AppState {
    pub raffles: Arc<RwLock<HashMap<RaffleId, RaffleSlot>>>,
    pub sessions: SessionRegistry,
    pub config: Arc<ServerConfig>,
    store: Arc<dyn SnapshotStore>,
    /// Set while a debounced save timer is pending
    save_pending: Arc<AtomicBool>,
    /// Serializes snapshot writes so an older snapshot never lands last
    save_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            raffles: Arc::new(RwLock::new(HashMap::new())),
            sessions: SessionRegistry::new(),
            config: Arc::new(config),
            store,
            save_pending: Arc::new(AtomicBool::new(false)),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build state from whatever snapshot the store holds
    pub async fn load(config: ServerConfig, store: Arc<dyn SnapshotStore>) -> Self {
        let records = persistence::load_or_empty(store.as_ref()).await;
        let state = Self::new(config, store);
        {
            let mut raffles = state.raffles.write().await;
            for record in records {
                raffles.insert(record.id.clone(), Arc::new(Mutex::new(record)));
            }
        }
        state
    }

    pub async fn raffle_count(&self) -> usize {
        self.raffles.read().await.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            ServerConfig::default(),
            Arc::new(MemorySnapshotStore::new()),
        )
    }
}
