//! Flat JSON file backend: one file per collection under a data directory.

pub mod config;
pub mod error;
pub mod store;

pub use config::JsonStoreConfig;
pub use store::JsonFileStore;
