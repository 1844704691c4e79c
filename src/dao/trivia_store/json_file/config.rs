use std::path::PathBuf;

/// Environment variable overriding the configured data directory.
pub const DATA_DIR_ENV: &str = "TILE_TRIVIA_DATA_DIR";

/// Runtime configuration describing where the JSON collections live.
#[derive(Debug, Clone)]
pub struct JsonStoreConfig {
    pub data_dir: PathBuf,
}

impl JsonStoreConfig {
    /// Construct a configuration rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Apply the [`DATA_DIR_ENV`] override when it is set to a non-empty value.
    pub fn with_env_override(self) -> Self {
        match std::env::var_os(DATA_DIR_ENV) {
            Some(value) if !value.is_empty() => Self::new(value),
            _ => self,
        }
    }
}
