//! GraphStore trait definition for graph database interaction

use async_trait::async_trait;

use crate::data::{errors::StateStoreError, trace_context::TraceContext, types::Row};
use crate::query::traversal::Traversal;

/// The interface for executing traversals against the graph database.
/// This abstracts the underlying database technology (e.g., Neo4j).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Executes one traversal and returns its rows.
    ///
    /// Contract: runs the traversal as a single unit (one statement for
    /// stores that speak Cypher), so multi-vertex mutations are atomic.
    /// Rows are keyed by the traversal's declared columns. A row may instead
    /// carry a `property_block` column holding the flattened textual form;
    /// decoding it is left to the caller.
    async fn execute(
        &self,
        trace_ctx: &TraceContext,
        traversal: &Traversal,
    ) -> Result<Vec<Row>, StateStoreError>;

    /// Cheap round trip used to check that the store is reachable.
    async fn ping(&self, trace_ctx: &TraceContext) -> Result<(), StateStoreError>;
}
