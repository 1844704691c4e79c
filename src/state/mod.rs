pub mod board;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::trivia_store::TriviaStore, error::ServiceError,
    state::board::BoardSession,
};

pub use self::sse::SseHub;
use self::sse::SseChannels;

pub type SharedState = Arc<AppState>;

/// Write gates serialising the read-modify-write cycle of each persisted collection.
#[derive(Default)]
pub struct CollectionGates {
    /// Guards `pools.json`.
    pub pools: Mutex<()>,
    /// Guards `rounds.json`.
    pub rounds: Mutex<()>,
    /// Guards `players.json`.
    pub players: Mutex<()>,
    /// Guards `inventory_items.json`.
    pub inventory: Mutex<()>,
    /// Guards `settings.json`.
    pub settings: Mutex<()>,
}

/// Central application state storing the store handle, broadcast hubs and board sessions.
pub struct AppState {
    config: Arc<AppConfig>,
    store: RwLock<Option<Arc<dyn TriviaStore>>>,
    sse: SseChannels,
    boards: DashMap<Uuid, BoardSession>,
    gates: CollectionGates,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config: Arc::new(config),
            store: RwLock::new(None),
            sse: SseChannels::default(),
            boards: DashMap::new(),
            gates: CollectionGates::default(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn TriviaStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with [`ServiceError::Degraded`].
    pub async fn require_store(&self) -> Result<Arc<dyn TriviaStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn TriviaStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Per-collection write gates.
    pub fn gates(&self) -> &CollectionGates {
        &self.gates
    }

    /// Live board sessions keyed by their identifier.
    pub fn boards(&self) -> &DashMap<Uuid, BoardSession> {
        &self.boards
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse.public
    }

    /// Broadcast hub used for the admin SSE stream.
    pub fn admin_sse(&self) -> &SseHub {
        &self.sse.admin
    }

    /// Token guard that ensures a single admin SSE subscriber at a time.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        &self.sse.admin_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_flag_only_notifies_on_change() {
        let state = AppState::new(AppConfig::default());
        let mut watcher = state.degraded_watcher();
        assert!(state.is_degraded());

        state.update_degraded(true);
        assert!(!watcher.has_changed().unwrap());

        state.update_degraded(false);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
    }

    #[tokio::test]
    async fn require_store_fails_while_degraded() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));
    }
}
