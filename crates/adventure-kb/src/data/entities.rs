//! Domain entities hydrated from the graph

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::bonus;
use crate::data::errors::CoreError;
use crate::data::identifiers::{AttributeId, CharacterId, CompletionId, HabitId};
use crate::schema::AttributeKind;

/// The six base ability scores supplied when a character is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseScores {
    pub strength: i64,
    pub dexterity: i64,
    pub constitution: i64,
    pub intelligence: i64,
    pub wisdom: i64,
    pub charisma: i64,
}

impl BaseScores {
    /// Scores in canonical order: STR, DEX, CON, INT, WIS, CHA.
    pub fn new(
        strength: i64,
        dexterity: i64,
        constitution: i64,
        intelligence: i64,
        wisdom: i64,
        charisma: i64,
    ) -> Self {
        Self { strength, dexterity, constitution, intelligence, wisdom, charisma }
    }

    pub fn get(&self, kind: AttributeKind) -> i64 {
        match kind {
            AttributeKind::Strength => self.strength,
            AttributeKind::Dexterity => self.dexterity,
            AttributeKind::Constitution => self.constitution,
            AttributeKind::Intelligence => self.intelligence,
            AttributeKind::Wisdom => self.wisdom,
            AttributeKind::Charisma => self.charisma,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeKind, i64)> + '_ {
        AttributeKind::ALL.iter().map(move |kind| (*kind, self.get(*kind)))
    }

    /// Scores are only required to be non-negative.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (kind, score) in self.iter() {
            validate_score(kind, score)?;
        }
        Ok(())
    }
}

impl Default for BaseScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

pub(crate) fn validate_score(kind: AttributeKind, score: i64) -> Result<(), CoreError> {
    if score < 0 {
        return Err(CoreError::ValidationError(format!(
            "{} must not be negative (got {})",
            kind, score
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i64,
    pub max: i64,
}

/// A character with its six attributes, each carrying its habits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub hit_points: HitPoints,
    /// Always six entries, in [`AttributeKind::ALL`] order.
    pub attributes: Vec<Attribute>,
}

impl Character {
    pub fn attribute(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.kind == kind)
    }

    pub fn effective_scores(&self) -> Vec<i64> {
        self.attributes.iter().map(|a| a.effective_score).collect()
    }

    pub fn modifiers(&self) -> Vec<i64> {
        self.attributes.iter().map(|a| a.modifier).collect()
    }

    pub fn habits(&self) -> impl Iterator<Item = &Habit> {
        self.attributes.iter().flat_map(|a| a.habits.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub character_id: CharacterId,
    pub kind: AttributeKind,
    pub base_score: i64,
    pub habit_points: i64,
    pub effective_score: i64,
    pub modifier: i64,
    pub habits: Vec<Habit>,
}

impl Attribute {
    /// Builds an attribute and derives its scores from the given habits.
    pub fn new(
        id: AttributeId,
        character_id: CharacterId,
        kind: AttributeKind,
        base_score: i64,
        habits: Vec<Habit>,
    ) -> Self {
        let habit_points = bonus::habit_points(
            habits.iter().map(|h| (h.completion_count, h.points_per_completion)),
        );
        let effective_score = bonus::effective_score(base_score, habit_points);
        Self {
            id,
            character_id,
            kind,
            base_score,
            habit_points,
            effective_score,
            modifier: bonus::modifier_for(effective_score),
            habits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub attribute_id: AttributeId,
    pub name: String,
    pub description: String,
    pub points_per_completion: i64,
    pub completion_count: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl Habit {
    pub fn habit_points(&self) -> i64 {
        bonus::habit_points([(self.completion_count, self.points_per_completion)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub id: CompletionId,
    pub habit_id: HabitId,
    pub date: NaiveDate,
}

/// Outcome of marking a habit done for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCompletion {
    pub completion: Completion,
    /// False when a completion for that day already existed.
    pub newly_recorded: bool,
    pub habit: Habit,
}

/// Outcome of un-marking a habit for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedCompletion {
    pub removed: bool,
    pub habit: Habit,
}
