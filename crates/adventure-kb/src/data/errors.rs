//! Error types for the Habits Adventure knowledge base

use thiserror::Error;

use crate::data::TraceContext;

/// Error returned by every public operation of the crate.
///
/// Callers at the HTTP boundary map `ValidationError` to 400,
/// `NotFound` to 404 and `StoreUnavailable` to 503.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Entity not found: type={entity_type} id={id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    #[error("Graph store unavailable: {message}")]
    StoreUnavailable {
        message: String,
        trace_id: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Data mapping error from graph result: {0}")]
    DataMapping(String),

    #[error("Internal system error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Helper to create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Helper to create a store unavailable error with context
    pub fn store_unavailable<E>(
        message: impl Into<String>,
        trace_ctx: Option<&TraceContext>,
        source: Option<E>,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CoreError::StoreUnavailable {
            message: message.into(),
            trace_id: trace_ctx.map(|ctx| ctx.trace_id.to_string()),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Wraps a store-level failure, keeping the trace id of the request.
    pub fn from_store(error: StateStoreError, trace_ctx: &TraceContext) -> Self {
        match error {
            StateStoreError::MappingError(msg) => CoreError::DataMapping(msg),
            StateStoreError::InvalidInput(msg) => CoreError::ValidationError(msg),
            other => CoreError::store_unavailable(
                "Graph store request failed",
                Some(trace_ctx),
                Some(other),
            ),
        }
    }

    /// Only store outages are worth retrying. The crate never retries itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

/// Specific error type for the graph store (database interaction).
#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("Graph database connection error: {0}")]
    ConnectionError(String),
    #[error("Graph database request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("Graph query execution error: {0}")]
    QueryError(String),
    #[error("Data mapping error from graph result: {0}")]
    MappingError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<StateStoreError> for CoreError {
    fn from(error: StateStoreError) -> Self {
        match error {
            StateStoreError::MappingError(msg) => CoreError::DataMapping(msg),
            StateStoreError::InvalidInput(msg) => CoreError::ValidationError(msg),
            other => CoreError::store_unavailable(
                "Graph store request failed",
                None,
                Some(other),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_core_error_display() {
        let error = CoreError::ValidationError("strength must not be negative".into());
        assert_eq!(format!("{}", error), "Invalid input: strength must not be negative");
    }

    #[test]
    fn test_state_store_error_display() {
        let error = StateStoreError::ConnectionError("connection refused".into());
        assert_eq!(format!("{}", error), "Graph database connection error: connection refused");
    }

    #[test]
    fn test_not_found_error() {
        let error = CoreError::not_found("Habit", "h1");

        match error {
            CoreError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "Habit");
                assert_eq!(id, "h1");
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_store_errors_map_to_store_unavailable() {
        let trace_ctx = TraceContext::new_root();

        let error = CoreError::from_store(StateStoreError::Timeout(Duration::from_secs(5)), &trace_ctx);
        match &error {
            CoreError::StoreUnavailable { trace_id, source, .. } => {
                assert_eq!(trace_id.as_deref(), Some(trace_ctx.trace_id.as_str()));
                assert!(source.is_some());
            }
            other => panic!("Expected StoreUnavailable, got {:?}", other),
        }
        assert!(error.is_retryable());

        let error: CoreError = StateStoreError::QueryError("syntax".into()).into();
        assert!(error.is_retryable());
    }

    #[test]
    fn test_mapping_errors_are_not_retryable() {
        let trace_ctx = TraceContext::new_root();
        let error = CoreError::from_store(StateStoreError::MappingError("bad row".into()), &trace_ctx);
        assert!(matches!(error, CoreError::DataMapping(_)));
        assert!(!error.is_retryable());
    }
}
