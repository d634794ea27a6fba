//! Core services for the Habits Adventure knowledge base

pub mod character_service;
pub mod hydrate;

// Re-exports
pub use character_service::{CharacterService, DEFAULT_QUERY_TIMEOUT};
