/// Persisted entity definitions shared by every storage backend.
pub mod models;
/// Storage error abstraction for collection operations.
pub mod storage;
/// Collection store trait and its JSON file implementation.
pub mod trivia_store;
