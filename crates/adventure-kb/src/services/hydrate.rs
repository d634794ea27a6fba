//! Turns result rows into domain entities.
//!
//! Rows arrive keyed by the column names in [`crate::schema::column`]. Any
//! row that carries the flattened `property_block` text is first decoded so
//! the rest of this module only ever sees plain columns.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

use crate::bonus;
use crate::data::{
    Attribute, AttributeId, Character, CharacterId, Completion, CompletionId, CoreError,
    GraphValue, Habit, HabitId, HitPoints, Row,
};
use crate::query::builder::parse_date;
use crate::query::property_block::PropertyBlock;
use crate::schema::{column, AttributeKind};

/// Merges a `property_block` column into the row. Decoded keys only fill
/// columns that are absent or null.
pub fn decode_property_block(mut row: Row) -> Row {
    let text = match row.remove(column::PROPERTY_BLOCK) {
        Some(GraphValue::String(text)) => text,
        Some(_) | None => return row,
    };

    for (key, value) in PropertyBlock::parse(&text).into_row() {
        let slot = row.entry(key).or_insert(GraphValue::Null);
        if slot.is_null() {
            *slot = value;
        }
    }
    row
}

pub fn decode_rows(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter().map(decode_property_block).collect()
}

fn value<'a>(row: &'a Row, key: &str) -> Option<&'a GraphValue> {
    row.get(key).filter(|v| !v.is_null())
}

pub(crate) fn required_str<'a>(row: &'a Row, key: &str) -> Result<&'a str, CoreError> {
    value(row, key)
        .and_then(GraphValue::as_str)
        .ok_or_else(|| CoreError::DataMapping(format!("Missing or non-string column '{}'", key)))
}

pub(crate) fn required_i64(row: &Row, key: &str) -> Result<i64, CoreError> {
    value(row, key)
        .and_then(GraphValue::as_i64)
        .ok_or_else(|| CoreError::DataMapping(format!("Missing or non-integer column '{}'", key)))
}

fn optional_i64(row: &Row, key: &str) -> Result<Option<i64>, CoreError> {
    match value(row, key) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| CoreError::DataMapping(format!("Non-integer column '{}': {}", key, v))),
    }
}

pub(crate) fn required_id<T: FromStr>(row: &Row, key: &str) -> Result<T, CoreError> {
    let raw = required_str(row, key)?;
    raw.parse::<T>()
        .map_err(|_| CoreError::DataMapping(format!("Column '{}' is not a valid id: {}", key, raw)))
}

pub(crate) fn has_value(row: &Row, key: &str) -> bool {
    value(row, key).is_some()
}

/// Timestamps are written as RFC 3339. Unreadable ones are dropped rather
/// than failing the whole read.
fn timestamp(row: &Row, key: &str) -> Option<DateTime<Utc>> {
    let raw = value(row, key)?.as_str()?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring unreadable timestamp in column '{}': {} ({})", key, raw, e);
            None
        }
    }
}

fn date(row: &Row, key: &str) -> Result<NaiveDate, CoreError> {
    let raw = required_str(row, key)?;
    parse_date(raw)
        .ok_or_else(|| CoreError::DataMapping(format!("Column '{}' is not a date: {}", key, raw)))
}

/// A habit from a row carrying the habit columns.
pub fn habit_from_row(row: &Row) -> Result<Habit, CoreError> {
    Ok(Habit {
        id: required_id(row, column::HABIT_ID)?,
        attribute_id: required_id(row, column::ATTRIBUTE_ID)?,
        name: required_str(row, column::HABIT_NAME)?.to_string(),
        description: value(row, column::HABIT_DESCRIPTION)
            .and_then(GraphValue::as_str)
            .unwrap_or_default()
            .to_string(),
        points_per_completion: required_i64(row, column::POINTS)?,
        completion_count: optional_i64(row, column::COMPLETION_COUNT)?.unwrap_or(0),
        created_at: timestamp(row, column::HABIT_CREATED_AT),
    })
}

pub fn completion_from_row(row: &Row) -> Result<Completion, CoreError> {
    Ok(Completion {
        id: required_id::<CompletionId>(row, column::COMPLETION_ID)?,
        habit_id: required_id::<HabitId>(row, column::HABIT_ID)?,
        date: date(row, column::COMPLETION_DATE)?,
    })
}

/// Hit points, defaulting missing values for characters written before
/// hit points were tracked.
pub fn hit_points_from_row(row: &Row) -> Result<HitPoints, CoreError> {
    let max = optional_i64(row, column::MAX_HP)?.unwrap_or(bonus::BASE_HIT_POINTS);
    let current = optional_i64(row, column::CURRENT_HP)?.unwrap_or(max);
    Ok(HitPoints { current, max })
}

struct AttributeParts {
    id: AttributeId,
    kind: AttributeKind,
    base_score: i64,
    habits: Vec<Habit>,
}

struct CharacterParts {
    id: CharacterId,
    name: String,
    created_at: Option<DateTime<Utc>>,
    hit_points: HitPoints,
    attributes: Vec<AttributeParts>,
}

impl CharacterParts {
    fn into_character(self) -> Character {
        let character_id = self.id;
        let mut attributes: Vec<Attribute> = self
            .attributes
            .into_iter()
            .map(|a| Attribute::new(a.id, character_id, a.kind, a.base_score, a.habits))
            .collect();
        attributes.sort_by_key(|a| a.kind.index());

        Character {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            hit_points: self.hit_points,
            attributes,
        }
    }
}

/// Groups rows of one `(character, attribute, habit)` shape into characters,
/// in the order their first row appears.
///
/// Rows without an attribute id contribute only the character header; rows
/// without a habit id contribute only the attribute.
pub fn characters_from_rows(rows: &[Row]) -> Result<Vec<Character>, CoreError> {
    let mut order: Vec<CharacterParts> = Vec::new();
    let mut index: HashMap<CharacterId, usize> = HashMap::new();

    for row in rows {
        let character_id: CharacterId = required_id(row, column::CHARACTER_ID)?;
        let slot = match index.get(&character_id) {
            Some(slot) => *slot,
            None => {
                order.push(CharacterParts {
                    id: character_id,
                    name: required_str(row, column::CHARACTER_NAME)?.to_string(),
                    created_at: timestamp(row, column::CHARACTER_CREATED_AT),
                    hit_points: hit_points_from_row(row)?,
                    attributes: Vec::new(),
                });
                index.insert(character_id, order.len() - 1);
                order.len() - 1
            }
        };
        let character = &mut order[slot];

        if !has_value(row, column::ATTRIBUTE_ID) {
            continue;
        }
        let attribute_id: AttributeId = required_id(row, column::ATTRIBUTE_ID)?;
        let attribute = match character.attributes.iter().position(|a| a.id == attribute_id) {
            Some(pos) => &mut character.attributes[pos],
            None => {
                let kind: AttributeKind = required_str(row, column::ATTRIBUTE_NAME)?
                    .parse()
                    .map_err(|e: CoreError| CoreError::DataMapping(e.to_string()))?;
                character.attributes.push(AttributeParts {
                    id: attribute_id,
                    kind,
                    base_score: required_i64(row, column::BASE_SCORE)?,
                    habits: Vec::new(),
                });
                let last = character.attributes.len() - 1;
                &mut character.attributes[last]
            }
        };

        if !has_value(row, column::HABIT_ID) {
            continue;
        }
        let habit = habit_from_row(row)?;
        if !attribute.habits.iter().any(|h| h.id == habit.id) {
            attribute.habits.push(habit);
        }
    }

    Ok(order.into_iter().map(CharacterParts::into_character).collect())
}

/// Exactly one character with all six attributes.
pub fn character_from_rows(rows: &[Row]) -> Result<Option<Character>, CoreError> {
    let mut characters = characters_from_rows(rows)?;
    match characters.len() {
        0 => Ok(None),
        1 => {
            let character = characters.remove(0);
            ensure_complete(&character)?;
            Ok(Some(character))
        }
        n => Err(CoreError::DataMapping(format!(
            "Expected one character in result, found {}",
            n
        ))),
    }
}

/// A stored character must own each of the six attributes exactly once.
pub fn ensure_complete(character: &Character) -> Result<(), CoreError> {
    let kinds: Vec<AttributeKind> = character.attributes.iter().map(|a| a.kind).collect();
    if kinds != AttributeKind::ALL {
        return Err(CoreError::DataMapping(format!(
            "Character {} has attributes {:?}, expected all six",
            character.id, kinds
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, GraphValue)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn character_header(id: &CharacterId) -> Vec<(&'static str, GraphValue)> {
        vec![
            (column::CHARACTER_ID, GraphValue::from(id.to_string())),
            (column::CHARACTER_NAME, GraphValue::from("Vigil")),
            (column::CHARACTER_CREATED_AT, GraphValue::from("2024-01-01T08:00:00+00:00")),
            (column::MAX_HP, GraphValue::Integer(10)),
            (column::CURRENT_HP, GraphValue::Integer(7)),
        ]
    }

    fn attribute_row(
        character: &CharacterId,
        kind: AttributeKind,
        attribute: &AttributeId,
        base: i64,
        habit: Option<(&HabitId, i64, i64)>,
    ) -> Row {
        let mut pairs = character_header(character);
        pairs.push((column::ATTRIBUTE_ID, GraphValue::from(attribute.to_string())));
        pairs.push((column::ATTRIBUTE_NAME, GraphValue::from(kind.as_str())));
        pairs.push((column::BASE_SCORE, GraphValue::Integer(base)));
        match habit {
            Some((id, points, count)) => {
                pairs.push((column::HABIT_ID, GraphValue::from(id.to_string())));
                pairs.push((column::HABIT_NAME, GraphValue::from("Run")));
                pairs.push((column::HABIT_DESCRIPTION, GraphValue::Null));
                pairs.push((column::POINTS, GraphValue::Integer(points)));
                pairs.push((column::COMPLETION_COUNT, GraphValue::Integer(count)));
            }
            None => {
                pairs.push((column::HABIT_ID, GraphValue::Null));
                pairs.push((column::COMPLETION_COUNT, GraphValue::Integer(0)));
            }
        }
        row(&pairs)
    }

    #[test]
    fn test_property_block_fills_missing_and_null_columns_only() {
        let decoded = decode_property_block(row(&[
            (column::CHARACTER_NAME, GraphValue::from("Kept")),
            (column::MAX_HP, GraphValue::Null),
            (
                column::PROPERTY_BLOCK,
                GraphValue::from(".property('character_name', 'Ignored'), .property('max_hp', 12), .property('current_hp', 4)"),
            ),
        ]));

        assert_eq!(decoded.get(column::CHARACTER_NAME), Some(&GraphValue::from("Kept")));
        assert_eq!(decoded.get(column::MAX_HP), Some(&GraphValue::Integer(12)));
        assert_eq!(decoded.get(column::CURRENT_HP), Some(&GraphValue::Integer(4)));
        assert!(decoded.get(column::PROPERTY_BLOCK).is_none());
    }

    #[test]
    fn test_character_hydration_groups_rows() {
        let character_id = CharacterId::new_v4();
        let habit_id = HabitId::new_v4();
        let ids: Vec<AttributeId> = (0..6).map(|_| AttributeId::new_v4()).collect();

        // Strength appears twice: once per habit row, habits deduplicated
        let mut rows: Vec<Row> = AttributeKind::ALL
            .iter()
            .rev()
            .zip(ids.iter().rev())
            .map(|(kind, id)| {
                let habit = (*kind == AttributeKind::Strength).then_some((&habit_id, 2, 3));
                attribute_row(&character_id, *kind, id, 10, habit)
            })
            .collect();
        rows.push(rows.last().cloned().unwrap());

        let character = character_from_rows(&rows).unwrap().unwrap();

        assert_eq!(character.name, "Vigil");
        assert_eq!(character.hit_points, HitPoints { current: 7, max: 10 });
        assert!(character.created_at.is_some());
        let kinds: Vec<AttributeKind> = character.attributes.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, AttributeKind::ALL.to_vec());

        let strength = character.attribute(AttributeKind::Strength).unwrap();
        assert_eq!(strength.habits.len(), 1);
        assert_eq!(strength.habits[0].description, "");
        assert_eq!(strength.habit_points, 6);
        assert_eq!(strength.effective_score, 16);
        assert_eq!(strength.modifier, 3);
    }

    #[test]
    fn test_incomplete_character_is_a_mapping_error() {
        let character_id = CharacterId::new_v4();
        let rows = vec![attribute_row(
            &character_id,
            AttributeKind::Wisdom,
            &AttributeId::new_v4(),
            11,
            None,
        )];

        assert!(matches!(character_from_rows(&rows), Err(CoreError::DataMapping(_))));
        assert_eq!(character_from_rows(&[]).unwrap(), None);
    }

    #[test]
    fn test_bad_values_are_mapping_errors() {
        let bad_id = row(&[(column::HABIT_ID, GraphValue::from("not-a-uuid"))]);
        assert!(matches!(habit_from_row(&bad_id), Err(CoreError::DataMapping(_))));

        let bad_date = row(&[
            (column::COMPLETION_ID, GraphValue::from(CompletionId::new_v4().to_string())),
            (column::HABIT_ID, GraphValue::from(HabitId::new_v4().to_string())),
            (column::COMPLETION_DATE, GraphValue::from("yesterday")),
        ]);
        assert!(matches!(completion_from_row(&bad_date), Err(CoreError::DataMapping(_))));
    }

    #[test]
    fn test_legacy_hit_points_default() {
        let hp = hit_points_from_row(&Row::new()).unwrap();
        assert_eq!(hp, HitPoints { current: 10, max: 10 });
    }
}
