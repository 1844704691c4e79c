/// Identifier generation for persisted entities.
pub mod id;
