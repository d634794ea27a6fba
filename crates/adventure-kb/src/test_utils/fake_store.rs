use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::bonus;
use crate::data::{
    errors::StateStoreError,
    trace_context::TraceContext,
    types::{GraphValue, Row},
};
use crate::query::builder::param;
use crate::query::property_block::PropertyBlock;
use crate::query::traversal::{Traversal, TraversalOp};
use crate::schema::{column, AttributeKind};
use crate::traits::graph_store::GraphStore;

#[derive(Debug, Clone)]
struct CharacterRecord {
    id: String,
    name: String,
    created_at: String,
    max_hp: Option<i64>,
    current_hp: Option<i64>,
}

#[derive(Debug, Clone)]
struct AttributeRecord {
    id: String,
    character_id: String,
    name: String,
    base_score: i64,
}

#[derive(Debug, Clone)]
struct HabitRecord {
    id: String,
    attribute_id: String,
    name: String,
    description: String,
    points: i64,
    created_at: String,
}

#[derive(Debug, Clone)]
struct CompletionRecord {
    id: String,
    habit_id: String,
    date: String,
}

/// Vertices keyed by id. Ownership edges are the owner ids on each child.
#[derive(Debug, Default)]
struct GraphState {
    characters: BTreeMap<String, CharacterRecord>,
    attributes: BTreeMap<String, AttributeRecord>,
    habits: BTreeMap<String, HabitRecord>,
    completions: BTreeMap<String, CompletionRecord>,
}

/// A fake implementation of GraphStore for testing.
///
/// Interprets each [`Traversal`] by its op tag and parameters against an
/// in-memory graph, with the same row shapes the Cypher statements return.
/// Every traversal runs under one lock, so it is as atomic as a statement.
/// Latency, failures and textual (`property_block`) rows can be injected.
#[derive(Debug, Clone, Default)]
pub struct FakeGraphStore {
    state: Arc<Mutex<GraphState>>,
    calls: Arc<Mutex<Vec<TraversalOp>>>,
    failures: Arc<Mutex<VecDeque<StateStoreError>>>,
    unavailable: Arc<Mutex<bool>>,
    latency: Arc<Mutex<Option<Duration>>>,
    textual_rows: Arc<Mutex<bool>>,
}

impl FakeGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls_for(&self, op: TraversalOp) -> usize {
        self.calls.lock().iter().filter(|c| **c == op).count()
    }

    /// Fails the next traversal with `error`. Queued errors are used in order.
    pub fn fail_next(&self, error: StateStoreError) {
        self.failures.lock().push_back(error);
    }

    /// While set, every traversal fails with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    /// Delays every traversal, e.g. to trip a caller's timeout.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Returns every row as a single `property_block` text column.
    pub fn set_textual_rows(&self, textual: bool) {
        *self.textual_rows.lock() = textual;
    }

    /// Total number of vertices of every label.
    pub fn vertex_count(&self) -> usize {
        let state = self.state.lock();
        state.characters.len() + state.attributes.len() + state.habits.len() + state.completions.len()
    }

    /// Number of completion vertices currently attached to a habit.
    pub fn completions_of(&self, habit_id: &str) -> usize {
        self.state
            .lock()
            .completions
            .values()
            .filter(|c| c.habit_id == habit_id)
            .count()
    }

    /// Drops the stored hit points of a character, as for characters written
    /// before hit points were tracked. Returns false for unknown ids.
    pub fn clear_hit_points(&self, character_id: &str) -> bool {
        match self.state.lock().characters.get_mut(character_id) {
            Some(c) => {
                c.max_hp = None;
                c.current_hp = None;
                true
            }
            None => false,
        }
    }

    fn apply(&self, traversal: &Traversal) -> Result<Vec<Row>, StateStoreError> {
        let mut state = self.state.lock();
        match traversal.op {
            TraversalOp::CreateCharacter => state.create_character(traversal),
            TraversalOp::GetCharacter => {
                let id = traversal.require_str(param::CHARACTER_ID)?;
                Ok(state.character_rows(id, None))
            }
            TraversalOp::ListCharacters => {
                let mut ordered: Vec<&CharacterRecord> = state.characters.values().collect();
                ordered.sort_by(|a, b| (&a.created_at, &a.id).cmp(&(&b.created_at, &b.id)));
                Ok(ordered
                    .iter()
                    .flat_map(|c| state.character_rows(&c.id, None))
                    .collect())
            }
            TraversalOp::UpdateAttributeScore => {
                let character_id = traversal.require_str(param::CHARACTER_ID)?;
                let name = traversal.require_str(param::ATTRIBUTE_NAME)?;
                let score = traversal.require_i64(param::BASE_SCORE)?;
                Ok(state
                    .attributes
                    .values_mut()
                    .find(|a| a.character_id == character_id && a.name == name)
                    .map(|a| {
                        a.base_score = score;
                        row([(column::ATTRIBUTE_ID, GraphValue::from(a.id.as_str()))])
                    })
                    .into_iter()
                    .collect())
            }
            TraversalOp::DeleteCharacter => {
                let id = traversal.require_str(param::CHARACTER_ID)?;
                Ok(state.delete_character(id).into_iter().collect())
            }
            TraversalOp::GetAttribute => {
                let id = traversal.require_str(param::ATTRIBUTE_ID)?;
                let owner = match state.attributes.get(id) {
                    Some(a) => a.character_id.clone(),
                    None => return Ok(Vec::new()),
                };
                Ok(state.character_rows(&owner, Some(id)))
            }
            TraversalOp::CreateHabit => state.create_habit(traversal),
            TraversalOp::GetHabit => {
                let id = traversal.require_str(param::HABIT_ID)?;
                Ok(state.habit_row(id).into_iter().collect())
            }
            TraversalOp::DeleteHabit => {
                let id = traversal.require_str(param::HABIT_ID)?;
                Ok(state.delete_habit(id).into_iter().collect())
            }
            TraversalOp::RecordCompletion => state.record_completion(traversal),
            TraversalOp::RemoveCompletion => state.remove_completion(traversal),
            TraversalOp::CompletionsBetween => state.completions_between(traversal),
            TraversalOp::AdjustHitPoints => {
                let id = traversal.require_str(param::CHARACTER_ID)?;
                let delta = traversal.require_i64(param::DELTA)?;
                Ok(state
                    .characters
                    .get_mut(id)
                    .map(|c| {
                        let cap = c.max_hp.unwrap_or(bonus::BASE_HIT_POINTS);
                        let current = c.current_hp.unwrap_or(cap);
                        let current = bonus::clamp_hit_points(current, delta, cap);
                        c.max_hp = Some(cap);
                        c.current_hp = Some(current);
                        row([
                            (column::CHARACTER_ID, GraphValue::from(c.id.as_str())),
                            (column::CURRENT_HP, GraphValue::Integer(current)),
                            (column::MAX_HP, GraphValue::Integer(cap)),
                        ])
                    })
                    .into_iter()
                    .collect())
            }
        }
    }
}

impl GraphState {
    fn create_character(&mut self, traversal: &Traversal) -> Result<Vec<Row>, StateStoreError> {
        let id = traversal.require_str(param::CHARACTER_ID)?.to_string();
        let max_hp = traversal.require_i64(param::MAX_HP)?;

        let mut attributes = Vec::with_capacity(AttributeKind::ALL.len());
        for kind in AttributeKind::ALL {
            attributes.push(AttributeRecord {
                id: traversal.require_str(&param::attribute_id(kind))?.to_string(),
                character_id: id.clone(),
                name: kind.as_str().to_string(),
                base_score: traversal.require_i64(&param::base_score(kind))?,
            });
        }

        self.characters.insert(
            id.clone(),
            CharacterRecord {
                id: id.clone(),
                name: traversal.require_str(param::NAME)?.to_string(),
                created_at: traversal.require_str(param::CREATED_AT)?.to_string(),
                max_hp: Some(max_hp),
                current_hp: Some(max_hp),
            },
        );
        for attribute in attributes {
            self.attributes.insert(attribute.id.clone(), attribute);
        }

        Ok(self.character_rows(&id, None))
    }

    /// One row per (attribute, habit) pair, with null habit columns for
    /// attributes without habits. `only_attribute` restricts the rows.
    fn character_rows(&self, character_id: &str, only_attribute: Option<&str>) -> Vec<Row> {
        let character = match self.characters.get(character_id) {
            Some(c) => c,
            None => return Vec::new(),
        };

        let mut attributes: Vec<&AttributeRecord> = self
            .attributes
            .values()
            .filter(|a| a.character_id == character_id)
            .filter(|a| only_attribute.map_or(true, |id| a.id == id))
            .collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));

        let header = || {
            row([
                (column::CHARACTER_ID, GraphValue::from(character.id.as_str())),
                (column::CHARACTER_NAME, GraphValue::from(character.name.as_str())),
                (column::CHARACTER_CREATED_AT, GraphValue::from(character.created_at.as_str())),
                (column::MAX_HP, optional_int(character.max_hp)),
                (column::CURRENT_HP, optional_int(character.current_hp)),
            ])
        };

        let mut rows = Vec::new();
        for attribute in attributes {
            let mut base = header();
            base.insert(column::ATTRIBUTE_ID.into(), GraphValue::from(attribute.id.as_str()));
            base.insert(column::ATTRIBUTE_NAME.into(), GraphValue::from(attribute.name.as_str()));
            base.insert(column::BASE_SCORE.into(), GraphValue::Integer(attribute.base_score));

            let mut habits: Vec<&HabitRecord> = self
                .habits
                .values()
                .filter(|h| h.attribute_id == attribute.id)
                .collect();
            habits.sort_by(|a, b| a.name.cmp(&b.name));

            if habits.is_empty() {
                let mut r = base;
                for key in [
                    column::HABIT_ID,
                    column::HABIT_NAME,
                    column::HABIT_DESCRIPTION,
                    column::POINTS,
                    column::HABIT_CREATED_AT,
                ] {
                    r.insert(key.into(), GraphValue::Null);
                }
                r.insert(column::COMPLETION_COUNT.into(), GraphValue::Integer(0));
                rows.push(r);
                continue;
            }

            for habit in habits {
                let mut r = base.clone();
                r.extend(self.habit_columns(habit));
                rows.push(r);
            }
        }
        rows
    }

    fn habit_columns(&self, habit: &HabitRecord) -> Row {
        row([
            (column::ATTRIBUTE_ID, GraphValue::from(habit.attribute_id.as_str())),
            (column::HABIT_ID, GraphValue::from(habit.id.as_str())),
            (column::HABIT_NAME, GraphValue::from(habit.name.as_str())),
            (column::HABIT_DESCRIPTION, GraphValue::from(habit.description.as_str())),
            (column::POINTS, GraphValue::Integer(habit.points)),
            (column::HABIT_CREATED_AT, GraphValue::from(habit.created_at.as_str())),
            (column::COMPLETION_COUNT, GraphValue::Integer(self.count_completions(&habit.id))),
        ])
    }

    fn habit_row(&self, habit_id: &str) -> Option<Row> {
        self.habits.get(habit_id).map(|h| self.habit_columns(h))
    }

    fn count_completions(&self, habit_id: &str) -> i64 {
        self.completions.values().filter(|c| c.habit_id == habit_id).count() as i64
    }

    fn delete_character(&mut self, character_id: &str) -> Option<Row> {
        self.characters.remove(character_id)?;

        let attribute_ids: Vec<String> = self
            .attributes
            .values()
            .filter(|a| a.character_id == character_id)
            .map(|a| a.id.clone())
            .collect();
        let habit_ids: Vec<String> = self
            .habits
            .values()
            .filter(|h| attribute_ids.contains(&h.attribute_id))
            .map(|h| h.id.clone())
            .collect();

        let before = self.completions.len();
        self.completions.retain(|_, c| !habit_ids.contains(&c.habit_id));
        let removed = attribute_ids.len() + habit_ids.len() + (before - self.completions.len());

        for id in &habit_ids {
            self.habits.remove(id);
        }
        for id in &attribute_ids {
            self.attributes.remove(id);
        }

        Some(row([
            (column::CHARACTER_ID, GraphValue::from(character_id)),
            (column::REMOVED, GraphValue::Integer(removed as i64)),
        ]))
    }

    fn create_habit(&mut self, traversal: &Traversal) -> Result<Vec<Row>, StateStoreError> {
        let attribute_id = traversal.require_str(param::ATTRIBUTE_ID)?;
        if !self.attributes.contains_key(attribute_id) {
            return Ok(Vec::new());
        }

        let habit = HabitRecord {
            id: traversal.require_str(param::HABIT_ID)?.to_string(),
            attribute_id: attribute_id.to_string(),
            name: traversal.require_str(param::NAME)?.to_string(),
            description: traversal.require_str(param::DESCRIPTION)?.to_string(),
            points: traversal.require_i64(param::POINTS)?,
            created_at: traversal.require_str(param::CREATED_AT)?.to_string(),
        };
        let id = habit.id.clone();
        self.habits.insert(id.clone(), habit);

        Ok(self.habit_row(&id).into_iter().collect())
    }

    fn delete_habit(&mut self, habit_id: &str) -> Option<Row> {
        self.habits.remove(habit_id)?;
        let before = self.completions.len();
        self.completions.retain(|_, c| c.habit_id != habit_id);

        Some(row([
            (column::HABIT_ID, GraphValue::from(habit_id)),
            (column::REMOVED, GraphValue::Integer((before - self.completions.len()) as i64)),
        ]))
    }

    fn record_completion(&mut self, traversal: &Traversal) -> Result<Vec<Row>, StateStoreError> {
        let habit_id = traversal.require_str(param::HABIT_ID)?;
        let date = traversal.require_str(param::DATE)?;
        if !self.habits.contains_key(habit_id) {
            return Ok(Vec::new());
        }

        let existing = self
            .completions
            .values()
            .find(|c| c.habit_id == habit_id && c.date == date)
            .map(|c| c.id.clone());
        let completion_id = match existing {
            Some(id) => id,
            None => {
                let id = traversal.require_str(param::COMPLETION_ID)?.to_string();
                self.completions.insert(
                    id.clone(),
                    CompletionRecord {
                        id: id.clone(),
                        habit_id: habit_id.to_string(),
                        date: date.to_string(),
                    },
                );
                id
            }
        };

        Ok(self
            .habit_row(habit_id)
            .map(|mut r| {
                r.insert(column::COMPLETION_ID.into(), GraphValue::from(completion_id));
                r.insert(column::COMPLETION_DATE.into(), GraphValue::from(date));
                r
            })
            .into_iter()
            .collect())
    }

    fn remove_completion(&mut self, traversal: &Traversal) -> Result<Vec<Row>, StateStoreError> {
        let habit_id = traversal.require_str(param::HABIT_ID)?;
        let date = traversal.require_str(param::DATE)?;
        if !self.habits.contains_key(habit_id) {
            return Ok(Vec::new());
        }

        let before = self.completions.len();
        self.completions
            .retain(|_, c| !(c.habit_id == habit_id && c.date == date));
        let removed = (before - self.completions.len()) as i64;

        Ok(self
            .habit_row(habit_id)
            .map(|mut r| {
                r.insert(column::REMOVED.into(), GraphValue::Integer(removed));
                r
            })
            .into_iter()
            .collect())
    }

    fn completions_between(&self, traversal: &Traversal) -> Result<Vec<Row>, StateStoreError> {
        let character_id = traversal.require_str(param::CHARACTER_ID)?;
        let from = traversal.require_str(param::FROM)?;
        let to = traversal.require_str(param::TO)?;
        if !self.characters.contains_key(character_id) {
            return Ok(Vec::new());
        }

        let habit_ids: Vec<&str> = self
            .habits
            .values()
            .filter(|h| {
                self.attributes
                    .get(&h.attribute_id)
                    .map_or(false, |a| a.character_id == character_id)
            })
            .map(|h| h.id.as_str())
            .collect();

        let mut matched: Vec<&CompletionRecord> = self
            .completions
            .values()
            .filter(|c| habit_ids.contains(&c.habit_id.as_str()))
            .filter(|c| c.date.as_str() >= from && c.date.as_str() <= to)
            .collect();
        matched.sort_by(|a, b| (&a.date, &a.habit_id).cmp(&(&b.date, &b.habit_id)));

        if matched.is_empty() {
            return Ok(vec![row([
                (column::CHARACTER_ID, GraphValue::from(character_id)),
                (column::HABIT_ID, GraphValue::Null),
                (column::COMPLETION_ID, GraphValue::Null),
                (column::COMPLETION_DATE, GraphValue::Null),
            ])]);
        }

        Ok(matched
            .into_iter()
            .map(|c| {
                row([
                    (column::CHARACTER_ID, GraphValue::from(character_id)),
                    (column::HABIT_ID, GraphValue::from(c.habit_id.as_str())),
                    (column::COMPLETION_ID, GraphValue::from(c.id.as_str())),
                    (column::COMPLETION_DATE, GraphValue::from(c.date.as_str())),
                ])
            })
            .collect())
    }
}

fn row<const N: usize>(pairs: [(&str, GraphValue); N]) -> Row {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn optional_int(value: Option<i64>) -> GraphValue {
    value.map_or(GraphValue::Null, GraphValue::Integer)
}

/// Flattens a row into its textual form. Nulls are dropped.
fn to_property_block_row(r: Row) -> Row {
    let mut entries: Vec<(String, GraphValue)> =
        r.into_iter().filter(|(_, v)| !v.is_null()).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let block: PropertyBlock = entries.into_iter().collect();
    row([(column::PROPERTY_BLOCK, GraphValue::String(block.render()))])
}

#[async_trait]
impl GraphStore for FakeGraphStore {
    async fn execute(
        &self,
        trace_ctx: &TraceContext,
        traversal: &Traversal,
    ) -> Result<Vec<Row>, StateStoreError> {
        self.calls.lock().push(traversal.op);
        debug!(trace_id = %trace_ctx.trace_id, op = %traversal.op, "Fake store executing traversal");

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if *self.unavailable.lock() {
            return Err(StateStoreError::ConnectionError("fake store is unavailable".into()));
        }
        let injected = self.failures.lock().pop_front();
        if let Some(error) = injected {
            return Err(error);
        }

        let rows = self.apply(traversal)?;
        if *self.textual_rows.lock() {
            return Ok(rows.into_iter().map(to_property_block_row).collect());
        }
        Ok(rows)
    }

    async fn ping(&self, _trace_ctx: &TraceContext) -> Result<(), StateStoreError> {
        if *self.unavailable.lock() {
            return Err(StateStoreError::ConnectionError("fake store is unavailable".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BaseScores, HabitId};
    use crate::query::builder::TraversalBuilder;
    use chrono::NaiveDate;

    fn string_param(traversal: &Traversal, key: &str) -> String {
        traversal.require_str(key).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_character_writes_seven_vertices() {
        let store = FakeGraphStore::new();
        let ctx = TraceContext::new_root();
        let create = TraversalBuilder::create_character("Vigil", BaseScores::default()).unwrap();

        let rows = store.execute(&ctx, &create).await.unwrap();

        assert_eq!(rows.len(), 6);
        assert_eq!(store.vertex_count(), 7);
        assert_eq!(store.calls_for(TraversalOp::CreateCharacter), 1);
    }

    #[tokio::test]
    async fn test_record_completion_is_idempotent_per_day() {
        let store = FakeGraphStore::new();
        let ctx = TraceContext::new_root();
        let create = TraversalBuilder::create_character("Vigil", BaseScores::default()).unwrap();
        store.execute(&ctx, &create).await.unwrap();

        let attribute_id = string_param(&create, &param::attribute_id(AttributeKind::Strength));
        let habit = TraversalBuilder::create_habit(attribute_id.parse().unwrap(), "Run", 1, "").unwrap();
        store.execute(&ctx, &habit).await.unwrap();
        let habit_id: HabitId = string_param(&habit, param::HABIT_ID).parse().unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        for _ in 0..2 {
            let record = TraversalBuilder::record_completion(habit_id, day).unwrap();
            let rows = store.execute(&ctx, &record).await.unwrap();
            assert_eq!(rows[0].get(column::COMPLETION_COUNT), Some(&GraphValue::Integer(1)));
        }
        assert_eq!(store.completions_of(&habit_id.to_string()), 1);
    }

    #[tokio::test]
    async fn test_injected_failures_and_textual_rows() {
        let store = FakeGraphStore::new();
        let ctx = TraceContext::new_root();
        let list = TraversalBuilder::list_characters().unwrap();

        store.fail_next(StateStoreError::QueryError("boom".into()));
        assert!(matches!(
            store.execute(&ctx, &list).await,
            Err(StateStoreError::QueryError(_))
        ));
        assert!(store.execute(&ctx, &list).await.unwrap().is_empty());

        store.set_unavailable(true);
        assert!(store.ping(&ctx).await.is_err());
        store.set_unavailable(false);

        let create = TraversalBuilder::create_character("Vigil", BaseScores::default()).unwrap();
        store.set_textual_rows(true);
        let rows = store.execute(&ctx, &create).await.unwrap();
        let text = rows[0].get(column::PROPERTY_BLOCK).and_then(GraphValue::as_str).unwrap();
        assert!(text.contains(".property('character_name', 'Vigil')"));
        assert!(!text.contains("habit_id"));
    }
}
