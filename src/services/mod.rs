pub mod assignment;
pub mod board_service;
pub mod documentation;
pub mod health_service;
pub mod inventory_service;
pub mod player_service;
pub mod pool_service;
pub mod round_service;
pub mod scoreboard_feed;
pub mod settings_service;
pub mod sse_events;
pub mod sse_service;
pub mod storage_supervisor;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::{
        config::AppConfig,
        dao::trivia_store::json_file::{JsonFileStore, JsonStoreConfig},
        state::{AppState, SharedState},
    };

    /// State backed by a JSON store in a fresh temporary directory.
    pub async fn state_with_config(config: AppConfig) -> (SharedState, TempDir) {
        let dir = TempDir::new().expect("create temp dir");
        let store = JsonFileStore::open(JsonStoreConfig::new(dir.path()))
            .await
            .expect("open store");
        let state = AppState::new(config.with_data_dir(dir.path()));
        state.set_store(Arc::new(store)).await;
        (state, dir)
    }

    pub async fn state_with_store() -> (SharedState, TempDir) {
        state_with_config(AppConfig::default()).await
    }
}
