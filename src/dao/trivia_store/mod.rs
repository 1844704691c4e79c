pub mod json_file;

use std::time::SystemTime;

use futures::future::BoxFuture;

use crate::dao::{
    models::{InventoryItemEntity, PlayerEntity, QuestionPoolEntity, RoundEntity, SettingsEntity},
    storage::StorageResult,
};

/// Abstraction over the persistence layer holding every trivia collection.
///
/// Each collection is loaded and saved wholesale; callers serialise their
/// read-modify-write cycles through the per-collection gates held in the shared state.
pub trait TriviaStore: Send + Sync {
    fn load_pools(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionPoolEntity>>>;
    fn save_pools(&self, pools: Vec<QuestionPoolEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn load_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>>;
    fn save_rounds(&self, rounds: Vec<RoundEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn load_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn save_players(&self, players: Vec<PlayerEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn load_inventory_items(&self) -> BoxFuture<'static, StorageResult<Vec<InventoryItemEntity>>>;
    fn save_inventory_items(
        &self,
        items: Vec<InventoryItemEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>>;
    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Last modification instant of the players collection, `None` when it was never written.
    fn players_modified(&self) -> BoxFuture<'static, StorageResult<Option<SystemTime>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
