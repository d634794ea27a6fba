//! Core data structures for the Habits Adventure knowledge base

pub mod types;
pub mod identifiers;
pub mod trace_context;
pub mod entities;
pub mod errors;

// Re-export all common types
pub use types::{GraphValue, Row};
pub use identifiers::{AttributeId, CharacterId, CompletionId, HabitId};
pub use trace_context::TraceContext;
pub use errors::{CoreError, StateStoreError};
pub use entities::*;
