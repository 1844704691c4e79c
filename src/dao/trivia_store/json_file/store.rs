use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{debug, warn};

use crate::dao::{
    models::{InventoryItemEntity, PlayerEntity, QuestionPoolEntity, RoundEntity, SettingsEntity},
    storage::StorageResult,
    trivia_store::TriviaStore,
};

use super::{
    config::JsonStoreConfig,
    error::{JsonStoreError, JsonStoreResult},
};

pub const POOLS_FILE: &str = "pools.json";
pub const ROUNDS_FILE: &str = "rounds.json";
pub const PLAYERS_FILE: &str = "players.json";
pub const INVENTORY_FILE: &str = "inventory_items.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Store persisting each collection as a pretty-printed JSON document.
#[derive(Clone)]
pub struct JsonFileStore {
    data_dir: Arc<Path>,
}

impl JsonFileStore {
    /// Open the store, creating the data directory when it does not exist yet.
    pub async fn open(config: JsonStoreConfig) -> JsonStoreResult<Self> {
        let store = Self {
            data_dir: Arc::from(config.data_dir.as_path()),
        };
        store.ensure_dir().await?;
        Ok(store)
    }

    /// Directory holding the collection files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    async fn ensure_dir(&self) -> JsonStoreResult<()> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|source| JsonStoreError::CreateDir {
                path: self.data_dir.to_path_buf(),
                source,
            })
    }

    /// Read a collection, reinitialising it with `T::default()` when it is
    /// missing or cannot be parsed.
    async fn read_or_heal<T>(&self, file: &str) -> JsonStoreResult<T>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let path = self.path(file);
        match fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<T>(&contents) {
                Ok(value) => Ok(value),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "malformed collection file; reinitialising with defaults"
                    );
                    self.heal(file).await
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "collection file missing; initialising");
                self.heal(file).await
            }
            Err(source) => Err(JsonStoreError::Read { path, source }),
        }
    }

    async fn heal<T>(&self, file: &str) -> JsonStoreResult<T>
    where
        T: Serialize + Default,
    {
        let value = T::default();
        self.write(file, &value).await?;
        Ok(value)
    }

    /// Replace a collection file by writing a sibling temporary file and renaming it over the target.
    async fn write<T>(&self, file: &str, value: &T) -> JsonStoreResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.ensure_dir().await?;
        let path = self.path(file);
        let payload =
            serde_json::to_vec_pretty(value).map_err(|source| JsonStoreError::Serialize {
                path: path.clone(),
                source,
            })?;

        let tmp = self.path(&format!("{file}.tmp"));
        fs::write(&tmp, payload)
            .await
            .map_err(|source| JsonStoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| JsonStoreError::Write { path, source })
    }

    async fn modified(&self, file: &str) -> JsonStoreResult<Option<SystemTime>> {
        let path = self.path(file);
        match fs::metadata(&path).await {
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|source| JsonStoreError::Metadata { path, source }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(JsonStoreError::Metadata { path, source }),
        }
    }

    async fn check_dir(&self) -> JsonStoreResult<()> {
        match fs::metadata(&self.data_dir).await {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Ok(()),
            _ => Err(JsonStoreError::DirUnusable {
                path: self.data_dir.to_path_buf(),
            }),
        }
    }

    fn load<T>(&self, file: &'static str) -> BoxFuture<'static, StorageResult<T>>
    where
        T: DeserializeOwned + Serialize + Default + Send + Sync + 'static,
    {
        let store = self.clone();
        Box::pin(async move { Ok(store.read_or_heal::<T>(file).await?) })
    }

    fn save<T>(&self, file: &'static str, value: T) -> BoxFuture<'static, StorageResult<()>>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let store = self.clone();
        Box::pin(async move { Ok(store.write(file, &value).await?) })
    }
}

impl TriviaStore for JsonFileStore {
    fn load_pools(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionPoolEntity>>> {
        self.load(POOLS_FILE)
    }

    fn save_pools(&self, pools: Vec<QuestionPoolEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.save(POOLS_FILE, pools)
    }

    fn load_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundEntity>>> {
        self.load(ROUNDS_FILE)
    }

    fn save_rounds(&self, rounds: Vec<RoundEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.save(ROUNDS_FILE, rounds)
    }

    fn load_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.load(PLAYERS_FILE)
    }

    fn save_players(&self, players: Vec<PlayerEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.save(PLAYERS_FILE, players)
    }

    fn load_inventory_items(&self) -> BoxFuture<'static, StorageResult<Vec<InventoryItemEntity>>> {
        self.load(INVENTORY_FILE)
    }

    fn save_inventory_items(
        &self,
        items: Vec<InventoryItemEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.save(INVENTORY_FILE, items)
    }

    fn load_settings(&self) -> BoxFuture<'static, StorageResult<SettingsEntity>> {
        self.load(SETTINGS_FILE)
    }

    fn save_settings(&self, settings: SettingsEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.save(SETTINGS_FILE, settings)
    }

    fn players_modified(&self) -> BoxFuture<'static, StorageResult<Option<SystemTime>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.modified(PLAYERS_FILE).await?) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.check_dir().await?) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_dir().await?;
            Ok(store.check_dir().await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::open(JsonStoreConfig::new(dir.path().join("data")))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_files_are_initialised_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert!(store.load_rounds().await.unwrap().is_empty());
        let settings = store.load_settings().await.unwrap();
        assert_eq!(settings, SettingsEntity::default());

        assert!(store.data_dir().join(ROUNDS_FILE).exists());
        assert!(store.data_dir().join(SETTINGS_FILE).exists());
    }

    #[tokio::test]
    async fn malformed_file_self_heals() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        std::fs::write(store.data_dir().join(POOLS_FILE), "{not json").unwrap();

        assert!(store.load_pools().await.unwrap().is_empty());
        let healed = std::fs::read_to_string(store.data_dir().join(POOLS_FILE)).unwrap();
        assert_eq!(healed.trim(), "[]");
    }

    #[tokio::test]
    async fn saved_collections_are_read_back() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let pool = QuestionPoolEntity {
            id: "p1".into(),
            name: "Capitals".into(),
            questions: Vec::new(),
        };

        store.save_pools(vec![pool.clone()]).await.unwrap();

        assert_eq!(store.load_pools().await.unwrap(), vec![pool]);
        assert!(!store.data_dir().join("pools.json.tmp").exists());
    }

    #[tokio::test]
    async fn players_modified_tracks_writes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert_eq!(store.players_modified().await.unwrap(), None);
        store.save_players(Vec::new()).await.unwrap();
        assert!(store.players_modified().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn health_check_fails_when_directory_disappears() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        assert!(store.health_check().await.is_ok());

        std::fs::remove_dir_all(store.data_dir()).unwrap();
        assert!(store.health_check().await.is_err());

        store.try_reconnect().await.unwrap();
        assert!(store.health_check().await.is_ok());
    }
}
