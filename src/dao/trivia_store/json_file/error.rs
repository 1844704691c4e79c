//! Error types raised by the JSON file storage implementation.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`JsonStoreError`] failures.
pub type JsonStoreResult<T> = Result<T, JsonStoreError>;

/// Failures that can occur while reading or writing collection files.
#[derive(Debug, Error)]
pub enum JsonStoreError {
    /// The data directory could not be created.
    #[error("failed to create data directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The data directory is missing or is not a directory.
    #[error("data directory `{path}` is not usable")]
    DirUnusable { path: PathBuf },
    /// Reading a collection file failed for a reason other than absence.
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing (or renaming) a collection file failed.
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Serialising a collection failed.
    #[error("failed to serialize `{path}`")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Inspecting file metadata failed.
    #[error("failed to stat `{path}`")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JsonStoreError {
    /// File or directory the failure concerns.
    pub fn path(&self) -> &Path {
        match self {
            JsonStoreError::CreateDir { path, .. }
            | JsonStoreError::DirUnusable { path }
            | JsonStoreError::Read { path, .. }
            | JsonStoreError::Write { path, .. }
            | JsonStoreError::Serialize { path, .. }
            | JsonStoreError::Metadata { path, .. } => path,
        }
    }
}

impl From<JsonStoreError> for StorageError {
    fn from(err: JsonStoreError) -> Self {
        match err {
            JsonStoreError::CreateDir { .. } | JsonStoreError::DirUnusable { .. } => {
                StorageError::Unusable(err.to_string())
            }
            _ => {
                let collection = err
                    .path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                StorageError::collection(collection, err.to_string(), err)
            }
        }
    }
}
