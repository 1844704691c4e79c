//! Application-level configuration loading: data location, game rules and stream timings.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::trivia_store::json_file::JsonStoreConfig;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TILE_TRIVIA_CONFIG_PATH";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_MAX_PLAYERS: usize = 10;
const DEFAULT_ANSWER_WINDOW_SECS: u64 = 30;
const DEFAULT_SCOREBOARD_POLL_MS: u64 = 100;
const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
const DEFAULT_BOARD_IDLE_MINS: u64 = 120;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    data_dir: PathBuf,
    max_players: usize,
    answer_window: Duration,
    scoreboard_poll_interval: Duration,
    client_reconnect_delay: Duration,
    board_idle_timeout: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        data_dir = %app_config.data_dir.display(),
                        max_players = app_config.max_players,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Storage configuration, honouring the data directory environment override.
    pub fn store_config(&self) -> JsonStoreConfig {
        JsonStoreConfig::new(self.data_dir.clone()).with_env_override()
    }

    /// Maximum number of players that may exist when a new one is created.
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Time a board gives players to answer an opened tile.
    pub fn answer_window(&self) -> Duration {
        self.answer_window
    }

    /// How often the scoreboard feed checks the players collection for changes.
    pub fn scoreboard_poll_interval(&self) -> Duration {
        self.scoreboard_poll_interval
    }

    /// Delay advertised to SSE clients before they reconnect after an error.
    pub fn client_reconnect_delay(&self) -> Duration {
        self.client_reconnect_delay
    }

    /// How long a board session may go unused before it is dropped.
    pub fn board_idle_timeout(&self) -> Duration {
        self.board_idle_timeout
    }

    /// Copy of this configuration rooted at another data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_players: DEFAULT_MAX_PLAYERS,
            answer_window: Duration::from_secs(DEFAULT_ANSWER_WINDOW_SECS),
            scoreboard_poll_interval: Duration::from_millis(DEFAULT_SCOREBOARD_POLL_MS),
            client_reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            board_idle_timeout: Duration::from_secs(DEFAULT_BOARD_IDLE_MINS * 60),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    data_dir: Option<PathBuf>,
    max_players: Option<usize>,
    answer_window_secs: Option<u64>,
    scoreboard_poll_ms: Option<u64>,
    reconnect_delay_ms: Option<u64>,
    board_idle_mins: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            data_dir: value.data_dir.unwrap_or(defaults.data_dir),
            max_players: value.max_players.unwrap_or(defaults.max_players),
            answer_window: value
                .answer_window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.answer_window),
            // A zero interval would turn the feed into a busy loop.
            scoreboard_poll_interval: value
                .scoreboard_poll_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.scoreboard_poll_interval),
            client_reconnect_delay: value
                .reconnect_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.client_reconnect_delay),
            board_idle_timeout: value
                .board_idle_mins
                .filter(|mins| *mins > 0)
                .map(|mins| Duration::from_secs(mins * 60))
                .unwrap_or(defaults.board_idle_timeout),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_keys() {
        let raw: RawConfig =
            serde_json::from_str(r#"{"dataDir":"/srv/trivia","maxPlayers":6}"#).unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.data_dir, PathBuf::from("/srv/trivia"));
        assert_eq!(config.max_players(), 6);
        assert_eq!(config.answer_window(), Duration::from_secs(30));
        assert_eq!(config.scoreboard_poll_interval(), Duration::from_millis(100));
        assert_eq!(config.board_idle_timeout(), Duration::from_secs(2 * 60 * 60));
    }

    #[test]
    fn zero_poll_interval_is_ignored() {
        let raw: RawConfig = serde_json::from_str(r#"{"scoreboardPollMs":0}"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.scoreboard_poll_interval(), Duration::from_millis(100));
    }
}
