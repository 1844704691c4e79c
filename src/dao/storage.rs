use std::error::Error;

use thiserror::Error;

/// Result alias for collection reads and writes.
pub type StorageResult<T> = Result<T, StorageError>;

/// Backend-neutral storage failure, as seen by the service layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing can be stored: the backing location is missing or read-only.
    #[error("storage location unusable: {0}")]
    Unusable(String),
    /// One collection could not be read or written.
    #[error("collection `{collection}` failed: {message}")]
    Collection {
        collection: String,
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Wrap a backend failure that concerns a single collection.
    pub fn collection(
        collection: impl Into<String>,
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Collection {
            collection: collection.into(),
            message: message.into(),
            source: Box::new(source),
        }
    }
}
