//! Habits Adventure knowledge base
//!
//! Stores RPG characters, their six ability attributes, the real-life habits
//! that train each attribute and the daily completions of those habits in a
//! property graph, and derives effective scores and modifiers from them.

// Core modules
pub mod bonus;
pub mod config;
pub mod data;
pub mod logging;
pub mod query;
pub mod schema;
pub mod services;
pub mod traits;

// Implementation adapters (optional, can be provided externally)
#[cfg(feature = "adapters")]
pub mod adapters;

// Testing utilities, public so integration tests and callers can use the fake store
pub mod test_utils;

// Re-export key types for convenient usage
pub use config::{AdventureConfig, GraphStoreConfig, LoggingConfig};
pub use data::errors::{CoreError, StateStoreError};
pub use data::identifiers::{AttributeId, CharacterId, CompletionId, HabitId};
pub use data::trace_context::TraceContext;
pub use data::types::{GraphValue, Row};
pub use data::entities::{
    Attribute, BaseScores, Character, Completion, Habit, HitPoints, RecordedCompletion,
    RemovedCompletion,
};
pub use query::{PropertyBlock, Traversal, TraversalBuilder, TraversalOp};
pub use schema::AttributeKind;
pub use services::CharacterService;
pub use traits::GraphStore;

#[cfg(feature = "adapters")]
pub use adapters::{Neo4jConfig, Neo4jGraphStore};

/// Initialize tracing with `RUST_LOG` and no further configuration
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
