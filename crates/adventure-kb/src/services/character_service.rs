use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::{
    data::{
        Attribute, AttributeId, BaseScores, Character, CharacterId, Completion, CoreError, Habit,
        HabitId, HitPoints, RecordedCompletion, RemovedCompletion, Row, StateStoreError,
        TraceContext,
    },
    query::builder::{param, TraversalBuilder},
    query::traversal::Traversal,
    schema::column,
    services::hydrate,
    traits::GraphStore,
};

/// Default per-request timeout applied to every store round trip.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// The public face of the knowledge base: builds a traversal per operation,
/// runs it against the shared [`GraphStore`] and hydrates the result.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct CharacterService {
    store: Arc<dyn GraphStore>,
    query_timeout: Duration,
}

impl CharacterService {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self::with_timeout(store, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<dyn GraphStore>, query_timeout: Duration) -> Self {
        Self { store, query_timeout }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Runs one traversal under the request timeout and decodes any textual
    /// property blocks in the result.
    async fn run(&self, trace_ctx: &TraceContext, traversal: &Traversal) -> Result<Vec<Row>, CoreError> {
        let child_ctx = trace_ctx.new_child();
        debug!(
            trace_id = %child_ctx.trace_id,
            span_id = %child_ctx.span_id,
            op = %traversal.op,
            "Executing traversal"
        );

        match tokio::time::timeout(self.query_timeout, self.store.execute(&child_ctx, traversal)).await {
            Ok(Ok(rows)) => Ok(hydrate::decode_rows(rows)),
            Ok(Err(e)) => {
                warn!(trace_id = %trace_ctx.trace_id, op = %traversal.op, error = %e, "Traversal failed");
                Err(CoreError::from_store(e, trace_ctx))
            }
            Err(_) => {
                warn!(
                    trace_id = %trace_ctx.trace_id,
                    op = %traversal.op,
                    "Traversal timed out after {:?}",
                    self.query_timeout
                );
                Err(CoreError::store_unavailable(
                    format!("{} timed out after {:?}", traversal.op, self.query_timeout),
                    Some(trace_ctx),
                    Some(StateStoreError::Timeout(self.query_timeout)),
                ))
            }
        }
    }

    /// Checks that the graph store answers.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn ping(&self, trace_ctx: &TraceContext) -> Result<(), CoreError> {
        match tokio::time::timeout(self.query_timeout, self.store.ping(trace_ctx)).await {
            Ok(result) => result.map_err(|e| CoreError::from_store(e, trace_ctx)),
            Err(_) => Err(CoreError::store_unavailable(
                "Ping timed out",
                Some(trace_ctx),
                Some(StateStoreError::Timeout(self.query_timeout)),
            )),
        }
    }

    /// Creates a character with its six attributes in one atomic write.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn create_character(
        &self,
        trace_ctx: &TraceContext,
        name: &str,
        scores: BaseScores,
    ) -> Result<Character, CoreError> {
        let traversal = TraversalBuilder::create_character(name, scores)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let character = hydrate::character_from_rows(&rows)?.ok_or_else(|| {
            CoreError::Internal("Character creation returned no rows".to_string())
        })?;
        info!(character_id = %character.id, "Created character");
        Ok(character)
    }

    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn get_character(
        &self,
        trace_ctx: &TraceContext,
        character_id: CharacterId,
    ) -> Result<Character, CoreError> {
        let traversal = TraversalBuilder::get_character(character_id)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        hydrate::character_from_rows(&rows)?
            .ok_or_else(|| CoreError::not_found(CharacterId::ENTITY, character_id))
    }

    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn list_characters(&self, trace_ctx: &TraceContext) -> Result<Vec<Character>, CoreError> {
        let traversal = TraversalBuilder::list_characters()?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let characters = hydrate::characters_from_rows(&rows)?;
        for character in &characters {
            hydrate::ensure_complete(character)?;
        }
        debug!("Listed {} characters", characters.len());
        Ok(characters)
    }

    /// Sets one base score and returns the character as it now stands.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn update_attribute_score(
        &self,
        trace_ctx: &TraceContext,
        character_id: CharacterId,
        attribute: &str,
        score: i64,
    ) -> Result<Character, CoreError> {
        let traversal = TraversalBuilder::update_attribute_score(character_id, attribute, score)?;
        let rows = self.run(trace_ctx, &traversal).await?;
        if rows.is_empty() {
            return Err(CoreError::not_found(CharacterId::ENTITY, character_id));
        }

        info!(character_id = %character_id, attribute = %attribute, score, "Updated base score");
        self.get_character(trace_ctx, character_id).await
    }

    /// Deletes the character and everything it owns.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn delete_character(
        &self,
        trace_ctx: &TraceContext,
        character_id: CharacterId,
    ) -> Result<(), CoreError> {
        let traversal = TraversalBuilder::delete_character(character_id)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let row = rows
            .first()
            .ok_or_else(|| CoreError::not_found(CharacterId::ENTITY, character_id))?;
        let removed = hydrate::required_i64(row, column::REMOVED)?;
        info!(character_id = %character_id, removed, "Deleted character and owned vertices");
        Ok(())
    }

    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn get_attribute(
        &self,
        trace_ctx: &TraceContext,
        attribute_id: AttributeId,
    ) -> Result<Attribute, CoreError> {
        let traversal = TraversalBuilder::get_attribute(attribute_id)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        hydrate::characters_from_rows(&rows)?
            .into_iter()
            .flat_map(|c| c.attributes)
            .find(|a| a.id == attribute_id)
            .ok_or_else(|| CoreError::not_found(AttributeId::ENTITY, attribute_id))
    }

    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn create_habit(
        &self,
        trace_ctx: &TraceContext,
        attribute_id: AttributeId,
        name: &str,
        points_per_completion: i64,
        description: &str,
    ) -> Result<Habit, CoreError> {
        let traversal =
            TraversalBuilder::create_habit(attribute_id, name, points_per_completion, description)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let row = rows
            .first()
            .ok_or_else(|| CoreError::not_found(AttributeId::ENTITY, attribute_id))?;
        let habit = hydrate::habit_from_row(row)?;
        info!(habit_id = %habit.id, attribute_id = %attribute_id, "Created habit");
        Ok(habit)
    }

    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn get_habit(&self, trace_ctx: &TraceContext, habit_id: HabitId) -> Result<Habit, CoreError> {
        let traversal = TraversalBuilder::get_habit(habit_id)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let row = rows
            .first()
            .ok_or_else(|| CoreError::not_found(HabitId::ENTITY, habit_id))?;
        hydrate::habit_from_row(row)
    }

    /// Marks a habit done for `date`. Recording the same day again changes
    /// nothing and reports `newly_recorded: false`.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn record_completion(
        &self,
        trace_ctx: &TraceContext,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> Result<RecordedCompletion, CoreError> {
        let traversal = TraversalBuilder::record_completion(habit_id, date)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let row = rows
            .first()
            .ok_or_else(|| CoreError::not_found(HabitId::ENTITY, habit_id))?;
        let completion = hydrate::completion_from_row(row)?;
        let requested_id = traversal.require_str(param::COMPLETION_ID)?;
        let newly_recorded = completion.id.to_string() == requested_id;

        if newly_recorded {
            info!(habit_id = %habit_id, date = %date, "Recorded completion");
        } else {
            debug!(habit_id = %habit_id, date = %date, "Completion already recorded for this day");
        }

        Ok(RecordedCompletion {
            completion,
            newly_recorded,
            habit: hydrate::habit_from_row(row)?,
        })
    }

    /// Un-marks a habit for `date`. Not having a completion that day is fine.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn remove_completion(
        &self,
        trace_ctx: &TraceContext,
        habit_id: HabitId,
        date: NaiveDate,
    ) -> Result<RemovedCompletion, CoreError> {
        let traversal = TraversalBuilder::remove_completion(habit_id, date)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let row = rows
            .first()
            .ok_or_else(|| CoreError::not_found(HabitId::ENTITY, habit_id))?;
        let removed = hydrate::required_i64(row, column::REMOVED)? > 0;
        if removed {
            info!(habit_id = %habit_id, date = %date, "Removed completion");
        }

        Ok(RemovedCompletion {
            removed,
            habit: hydrate::habit_from_row(row)?,
        })
    }

    /// Deletes the habit together with its completion history.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn delete_habit(&self, trace_ctx: &TraceContext, habit_id: HabitId) -> Result<(), CoreError> {
        let traversal = TraversalBuilder::delete_habit(habit_id)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        if rows.is_empty() {
            return Err(CoreError::not_found(HabitId::ENTITY, habit_id));
        }
        info!(habit_id = %habit_id, "Deleted habit");
        Ok(())
    }

    /// Completions of any of the character's habits dated within
    /// `[from, to]`, oldest first.
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn completions_between(
        &self,
        trace_ctx: &TraceContext,
        character_id: CharacterId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Completion>, CoreError> {
        let traversal = TraversalBuilder::completions_between(character_id, from, to)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        if rows.is_empty() {
            return Err(CoreError::not_found(CharacterId::ENTITY, character_id));
        }

        rows.iter()
            .filter(|row| hydrate::has_value(row, column::COMPLETION_ID))
            .map(hydrate::completion_from_row)
            .collect()
    }

    /// Applies damage (negative `delta`) or healing (positive `delta`).
    #[instrument(skip(self, trace_ctx), fields(trace_id = %trace_ctx.trace_id))]
    pub async fn adjust_hit_points(
        &self,
        trace_ctx: &TraceContext,
        character_id: CharacterId,
        delta: i64,
    ) -> Result<HitPoints, CoreError> {
        let traversal = TraversalBuilder::adjust_hit_points(character_id, delta)?;
        let rows = self.run(trace_ctx, &traversal).await?;

        let row = rows
            .first()
            .ok_or_else(|| CoreError::not_found(CharacterId::ENTITY, character_id))?;
        hydrate::hit_points_from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GraphValue;
    use crate::test_utils::FakeGraphStore;
    use crate::traits::MockGraphStore;
    use pretty_assertions::assert_eq;

    fn service_with_fake() -> (CharacterService, FakeGraphStore) {
        let fake = FakeGraphStore::new();
        (CharacterService::new(Arc::new(fake.clone())), fake)
    }

    #[tokio::test]
    async fn test_validation_errors_never_reach_the_store() {
        let mut mock = MockGraphStore::new();
        mock.expect_execute().times(0);
        let service = CharacterService::new(Arc::new(mock));
        let ctx = TraceContext::new_root();

        let result = service
            .create_character(&ctx, "Vigil", BaseScores::new(12, 14, -3, 19, 11, 9))
            .await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));

        let result = service.create_character(&ctx, "  ", BaseScores::default()).await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));

        let result = service
            .update_attribute_score(&ctx, CharacterId::new_v4(), "luck", 10)
            .await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));

        let result = service
            .create_habit(&ctx, AttributeId::new_v4(), "Run", 0, "")
            .await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));

        let from = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let result = service
            .completions_between(&ctx, CharacterId::new_v4(), from, to)
            .await;
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_store_errors_become_store_unavailable() {
        let mut mock = MockGraphStore::new();
        mock.expect_execute()
            .times(1)
            .returning(|_, _| Err(StateStoreError::ConnectionError("refused".into())));
        let service = CharacterService::new(Arc::new(mock));
        let ctx = TraceContext::new_root();

        let err = service.get_character(&ctx, CharacterId::new_v4()).await.unwrap_err();
        match err {
            CoreError::StoreUnavailable { trace_id, .. } => {
                assert_eq!(trace_id.as_deref(), Some(ctx.trace_id.as_str()));
            }
            other => panic!("Expected StoreUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unhydratable_rows_are_mapping_errors() {
        let mut mock = MockGraphStore::new();
        mock.expect_execute().returning(|_, _| {
            let mut row = Row::new();
            row.insert(column::HABIT_ID.to_string(), GraphValue::from("not-a-uuid"));
            Ok(vec![row])
        });
        let service = CharacterService::new(Arc::new(mock));

        let err = service
            .get_habit(&TraceContext::new_root(), HabitId::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DataMapping(_)));
    }

    #[tokio::test]
    async fn test_delete_without_removed_count_is_mapping_error() {
        let mut mock = MockGraphStore::new();
        mock.expect_execute().times(1).returning(|_, _| {
            let mut row = Row::new();
            row.insert(column::CHARACTER_ID.to_string(), GraphValue::from("c-1"));
            Ok(vec![row])
        });
        let service = CharacterService::new(Arc::new(mock));

        let err = service
            .delete_character(&TraceContext::new_root(), CharacterId::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DataMapping(msg) if msg.contains(column::REMOVED)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_store_unavailable() {
        let fake = FakeGraphStore::new();
        fake.set_latency(Some(Duration::from_millis(200)));
        let service = CharacterService::with_timeout(Arc::new(fake), Duration::from_millis(20));

        let err = service.list_characters(&TraceContext::new_root()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_found() {
        let (service, _fake) = service_with_fake();
        let ctx = TraceContext::new_root();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        assert!(service.get_character(&ctx, CharacterId::new_v4()).await.unwrap_err().is_not_found());
        assert!(service.delete_character(&ctx, CharacterId::new_v4()).await.unwrap_err().is_not_found());
        assert!(service
            .update_attribute_score(&ctx, CharacterId::new_v4(), "strength", 3)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(service.get_attribute(&ctx, AttributeId::new_v4()).await.unwrap_err().is_not_found());
        assert!(service
            .create_habit(&ctx, AttributeId::new_v4(), "Run", 1, "")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(service.record_completion(&ctx, HabitId::new_v4(), day).await.unwrap_err().is_not_found());
        assert!(service.remove_completion(&ctx, HabitId::new_v4(), day).await.unwrap_err().is_not_found());
        assert!(service.delete_habit(&ctx, HabitId::new_v4()).await.unwrap_err().is_not_found());
        assert!(service
            .completions_between(&ctx, CharacterId::new_v4(), day, day)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(service.adjust_hit_points(&ctx, CharacterId::new_v4(), -1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_hit_points_are_clamped() {
        let (service, _fake) = service_with_fake();
        let ctx = TraceContext::new_root();

        // Constitution 14 gives a +2 modifier
        let character = service
            .create_character(&ctx, "Vigil", BaseScores::new(10, 10, 14, 10, 10, 10))
            .await
            .unwrap();
        assert_eq!(character.hit_points, HitPoints { current: 12, max: 12 });

        let hp = service.adjust_hit_points(&ctx, character.id, -5).await.unwrap();
        assert_eq!(hp, HitPoints { current: 7, max: 12 });

        let hp = service.adjust_hit_points(&ctx, character.id, -50).await.unwrap();
        assert_eq!(hp.current, 0);

        let hp = service.adjust_hit_points(&ctx, character.id, 100).await.unwrap();
        assert_eq!(hp.current, 12);
    }

    #[tokio::test]
    async fn test_adjusting_untracked_hit_points_starts_from_full() {
        let (service, fake) = service_with_fake();
        let ctx = TraceContext::new_root();
        let character = service
            .create_character(&ctx, "Vigil", BaseScores::new(10, 10, 14, 10, 10, 10))
            .await
            .unwrap();
        assert!(fake.clear_hit_points(&character.id.to_string()));

        let untracked = service.get_character(&ctx, character.id).await.unwrap();
        assert_eq!(untracked.hit_points, HitPoints { current: 10, max: 10 });

        let hp = service.adjust_hit_points(&ctx, character.id, -1).await.unwrap();
        assert_eq!(hp, HitPoints { current: 9, max: 10 });

        let stored = service.get_character(&ctx, character.id).await.unwrap();
        assert_eq!(stored.hit_points, HitPoints { current: 9, max: 10 });
    }

    #[tokio::test]
    async fn test_remove_completion_unmarks_a_day() {
        let (service, _fake) = service_with_fake();
        let ctx = TraceContext::new_root();
        let character = service
            .create_character(&ctx, "Vigil", BaseScores::default())
            .await
            .unwrap();
        let wisdom = character.attribute(crate::schema::AttributeKind::Wisdom).unwrap();
        let habit = service
            .create_habit(&ctx, wisdom.id, "Meditate", 2, "Ten minutes")
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let recorded = service.record_completion(&ctx, habit.id, day).await.unwrap();
        assert!(recorded.newly_recorded);
        assert_eq!(recorded.habit.completion_count, 1);

        let removed = service.remove_completion(&ctx, habit.id, day).await.unwrap();
        assert!(removed.removed);
        assert_eq!(removed.habit.completion_count, 0);

        let removed = service.remove_completion(&ctx, habit.id, day).await.unwrap();
        assert!(!removed.removed);
    }
}
