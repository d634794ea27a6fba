use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use adventure_kb::{
    logging, AdventureConfig, AttributeKind, BaseScores, CharacterService, GraphStore,
    TraceContext,
};

#[cfg(feature = "adapters")]
async fn connect_graph(config: &AdventureConfig) -> anyhow::Result<Option<Arc<dyn GraphStore>>> {
    if config.graph.password.is_empty() {
        return Ok(None);
    }
    let store = adventure_kb::Neo4jGraphStore::new(config.graph.to_neo4j_config())
        .await
        .with_context(|| format!("Failed to connect to graph store at {}", config.graph.uri()))?;
    Ok(Some(Arc::new(store)))
}

#[cfg(not(feature = "adapters"))]
async fn connect_graph(_config: &AdventureConfig) -> anyhow::Result<Option<Arc<dyn GraphStore>>> {
    Ok(None)
}

/// Picks the Neo4j store when a password is configured, otherwise the
/// in-memory store.
async fn build_store(config: &AdventureConfig) -> anyhow::Result<Arc<dyn GraphStore>> {
    if let Some(store) = connect_graph(config).await? {
        return Ok(store);
    }

    warn!("No graph password configured, using the in-memory store");
    Ok(Arc::new(adventure_kb::test_utils::FakeGraphStore::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdventureConfig::from_env();
    logging::init_logging(&config.logging)?;

    let store = build_store(&config).await?;
    let service = CharacterService::with_timeout(store, config.graph.query_timeout());
    let trace_ctx = TraceContext::new_root();

    service.ping(&trace_ctx).await.context("Graph store is not reachable")?;

    // Walk one character through its whole life cycle
    let character = service
        .create_character(&trace_ctx, "Vigil", BaseScores::new(12, 14, 10, 19, 11, 9))
        .await?;
    let strength = character
        .attribute(AttributeKind::Strength)
        .context("New character has no strength attribute")?;

    let habit = service
        .create_habit(&trace_ctx, strength.id, "Morning run", 1, "Five kilometres")
        .await?;
    let today = Utc::now().date_naive();
    service.record_completion(&trace_ctx, habit.id, today).await?;

    let character = service.get_character(&trace_ctx, character.id).await?;
    for attribute in &character.attributes {
        info!(
            attribute = %attribute.kind,
            base = attribute.base_score,
            effective = attribute.effective_score,
            modifier = attribute.modifier,
            "Attribute"
        );
    }

    service.delete_character(&trace_ctx, character.id).await?;
    info!(character_id = %character.id, "Demo finished");

    Ok(())
}
