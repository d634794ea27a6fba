use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    data::{
        errors::StateStoreError,
        trace_context::TraceContext,
        types::{GraphValue, Row},
    },
    query::traversal::Traversal,
    traits::graph_store::GraphStore,
};

// Define a macro for Neo4j tracing with the TraceContext
macro_rules! trace_neo4j {
    ($trace_ctx:expr, $op:expr, $($arg:tt)*) => {
        let trace_id = $trace_ctx.trace_id.to_string();
        debug!("[Neo4j:{}][trace:{}] {}", $op, trace_id, format!($($arg)*));
    };
}

/// Configuration for Neo4j connection
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub pool_size: usize,
    pub connection_retry_count: u32,
    pub connection_retry_delay: Duration,
    pub query_timeout: Duration,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: None,
            pool_size: 10,
            connection_retry_count: 3,
            connection_retry_delay: Duration::from_secs(2),
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// Neo4j implementation of the `GraphStore` trait.
///
/// The `Graph` handle is an internally pooled set of connections; one store
/// is created at startup and shared behind an `Arc`.
pub struct Neo4jGraphStore {
    pub graph: Arc<Graph>,
    config: Neo4jConfig,
}

impl Neo4jGraphStore {
    /// Create a new Neo4jGraphStore, retrying the initial connection.
    pub async fn new(config: Neo4jConfig) -> Result<Self, StateStoreError> {
        let mut config_builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.username)
            .password(&config.password)
            .max_connections(config.pool_size);

        if let Some(db) = &config.database {
            config_builder = config_builder.db(db.as_str());
        }

        let neo4j_config = config_builder.build().map_err(|e| {
            StateStoreError::ConnectionError(format!("Failed to build Neo4j config: {}", e))
        })?;

        let attempts = config.connection_retry_count.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match Graph::connect(neo4j_config.clone()).await {
                Ok(graph) => {
                    info!("Connected to Neo4j at {} (attempt {})", config.uri, attempt);

                    // Test the connection with a simple query
                    match graph.run(Query::new("RETURN 1 AS test".to_string())).await {
                        Ok(()) => {
                            let store = Self {
                                graph: Arc::new(graph),
                                config,
                            };
                            store.ensure_schema().await?;
                            return Ok(store);
                        }
                        Err(e) => {
                            error!("Connection test failed: {}", e);
                            last_error = Some(e.to_string());
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to connect to Neo4j (attempt {}): {}", attempt, e);
                    last_error = Some(e.to_string());
                }
            }

            if attempt < attempts {
                tokio::time::sleep(config.connection_retry_delay).await;
            }
        }

        Err(StateStoreError::ConnectionError(format!(
            "Failed to connect to Neo4j at {} after {} attempts. Last error: {}",
            config.uri,
            attempts,
            last_error.unwrap_or_else(|| "unknown".to_string())
        )))
    }

    /// Creates the uniqueness constraints the statements rely on. Existing
    /// constraints are left alone.
    pub async fn ensure_schema(&self) -> Result<(), StateStoreError> {
        for statement in crate::schema::constraint_statements() {
            debug!("Ensuring constraint: {}", statement);
            self.graph.run(Query::new(statement.clone())).await.map_err(|e| {
                error!("Failed to create constraint: {}", e);
                StateStoreError::QueryError(format!("Failed to run `{}`: {}", statement, e))
            })?;
        }
        info!("Graph schema constraints are in place");
        Ok(())
    }

    /// Binds every traversal parameter. Nulls are left unbound so the
    /// statement sees them as missing, which Cypher treats as null.
    fn build_query(traversal: &Traversal) -> Query {
        let mut q = Query::new(traversal.statement.clone());
        for (key, value) in &traversal.params {
            match value {
                GraphValue::Null => {}
                GraphValue::Bool(b) => q = q.param(key, *b),
                GraphValue::Integer(i) => q = q.param(key, *i),
                GraphValue::String(s) => q = q.param(key, s.as_str()),
                GraphValue::List(items) => {
                    // Lists only ever carry strings
                    let strings: Vec<String> = items
                        .iter()
                        .map(|item| match item {
                            GraphValue::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect();
                    q = q.param(key, strings);
                }
            }
        }
        q
    }

    /// Convert a neo4rs::Row into a Row keyed by the traversal's columns.
    fn row_to_map(row: &neo4rs::Row, columns: &[&'static str]) -> Row {
        let mut map = Row::with_capacity(columns.len());

        for column in columns {
            let value = if let Ok(i) = row.get::<i64>(column) {
                GraphValue::Integer(i)
            } else if let Ok(s) = row.get::<String>(column) {
                GraphValue::String(s)
            } else if let Ok(b) = row.get::<bool>(column) {
                GraphValue::Bool(b)
            } else if let Ok(items) = row.get::<Vec<String>>(column) {
                GraphValue::List(items.into_iter().map(GraphValue::String).collect())
            } else {
                GraphValue::Null
            };
            map.insert(column.to_string(), value);
        }

        // Some console exports hand back the flattened textual form instead
        if let Ok(text) = row.get::<String>(crate::schema::column::PROPERTY_BLOCK) {
            map.insert(
                crate::schema::column::PROPERTY_BLOCK.to_string(),
                GraphValue::String(text),
            );
        }

        map
    }

    async fn run_traversal(&self, traversal: &Traversal) -> Result<Vec<Row>, StateStoreError> {
        let mut result = self
            .graph
            .execute(Self::build_query(traversal))
            .await
            .map_err(|e| StateStoreError::QueryError(format!("Failed to execute {}: {}", traversal.op, e)))?;

        let mut rows = Vec::new();
        loop {
            match result.next().await {
                Ok(Some(row)) => rows.push(Self::row_to_map(&row, &traversal.columns)),
                Ok(None) => break,
                Err(e) => {
                    return Err(StateStoreError::QueryError(format!(
                        "Failed to read result of {}: {}",
                        traversal.op, e
                    )));
                }
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    #[instrument(skip(self, traversal), fields(trace_id = %trace_ctx.trace_id, op = %traversal.op))]
    async fn execute(
        &self,
        trace_ctx: &TraceContext,
        traversal: &Traversal,
    ) -> Result<Vec<Row>, StateStoreError> {
        trace_neo4j!(trace_ctx, traversal.op, "Executing statement: {}", traversal.statement);

        match tokio::time::timeout(self.config.query_timeout, self.run_traversal(traversal)).await {
            Ok(Ok(rows)) => {
                trace_neo4j!(trace_ctx, traversal.op, "Returned {} rows", rows.len());
                Ok(rows)
            }
            Ok(Err(e)) => {
                error!("Neo4j traversal {} failed: {}", traversal.op, e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "Neo4j traversal {} timed out after {:?}",
                    traversal.op, self.config.query_timeout
                );
                Err(StateStoreError::Timeout(self.config.query_timeout))
            }
        }
    }

    #[instrument(skip(self), fields(trace_id = %trace_ctx.trace_id))]
    async fn ping(&self, trace_ctx: &TraceContext) -> Result<(), StateStoreError> {
        self.graph
            .run(Query::new("RETURN 1 AS ping".to_string()))
            .await
            .map_err(|e| StateStoreError::ConnectionError(format!("Ping failed: {}", e)))
    }
}
