//! Canonical vertex labels, edge labels and property keys.
//!
//! Every string that names something in the graph lives here; query building,
//! the in-memory store and hydration all refer to these constants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::errors::CoreError;

/// Vertex labels
pub mod label {
    pub const CHARACTER: &str = "Character";
    pub const ATTRIBUTE: &str = "Attribute";
    pub const HABIT: &str = "Habit";
    pub const COMPLETION: &str = "Completion";
}

/// Edge labels
pub mod edge {
    pub const HAS_ATTRIBUTE: &str = "HAS_ATTRIBUTE";
    pub const HAS_HABIT: &str = "HAS_HABIT";
    pub const HAS_COMPLETION: &str = "HAS_COMPLETION";
}

/// Property keys of `Character` vertices
pub mod character {
    pub const ID: &str = "character_id";
    pub const NAME: &str = "name";
    pub const CREATED_AT: &str = "created_at";
    pub const MAX_HP: &str = "max_hp";
    pub const CURRENT_HP: &str = "current_hp";
}

/// Property keys of `Attribute` vertices
pub mod attribute {
    pub const ID: &str = "attribute_id";
    pub const CHARACTER_ID: &str = "character_id";
    pub const NAME: &str = "name";
    pub const BASE_SCORE: &str = "base_score";
}

/// Property keys of `Habit` vertices
pub mod habit {
    pub const ID: &str = "habit_id";
    pub const ATTRIBUTE_ID: &str = "attribute_id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const POINTS: &str = "points_per_completion";
    pub const CREATED_AT: &str = "created_at";
}

/// Property keys of `Completion` vertices
pub mod completion {
    pub const ID: &str = "completion_id";
    pub const HABIT_ID: &str = "habit_id";
    pub const DATE: &str = "completion_date";
    pub const CREATED_AT: &str = "created_at";
}

/// Column aliases used in `RETURN` clauses. Rows coming back from the store
/// are keyed by these names, whichever store produced them.
pub mod column {
    pub const CHARACTER_ID: &str = "character_id";
    pub const CHARACTER_NAME: &str = "character_name";
    pub const CHARACTER_CREATED_AT: &str = "character_created_at";
    pub const MAX_HP: &str = "max_hp";
    pub const CURRENT_HP: &str = "current_hp";
    pub const ATTRIBUTE_ID: &str = "attribute_id";
    pub const ATTRIBUTE_NAME: &str = "attribute_name";
    pub const BASE_SCORE: &str = "base_score";
    pub const HABIT_ID: &str = "habit_id";
    pub const HABIT_NAME: &str = "habit_name";
    pub const HABIT_DESCRIPTION: &str = "habit_description";
    pub const POINTS: &str = "points_per_completion";
    pub const HABIT_CREATED_AT: &str = "habit_created_at";
    pub const COMPLETION_COUNT: &str = "completion_count";
    pub const COMPLETION_ID: &str = "completion_id";
    pub const COMPLETION_DATE: &str = "completion_date";
    pub const REMOVED: &str = "removed";
    /// Flattened `.property('k', v)` text some stores return instead of columns
    pub const PROPERTY_BLOCK: &str = "property_block";
}

/// The six fixed ability scores every Character owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl AttributeKind {
    /// Canonical order, used when creating and when presenting attributes.
    pub const ALL: [AttributeKind; 6] = [
        AttributeKind::Strength,
        AttributeKind::Dexterity,
        AttributeKind::Constitution,
        AttributeKind::Intelligence,
        AttributeKind::Wisdom,
        AttributeKind::Charisma,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Strength => "strength",
            AttributeKind::Dexterity => "dexterity",
            AttributeKind::Constitution => "constitution",
            AttributeKind::Intelligence => "intelligence",
            AttributeKind::Wisdom => "wisdom",
            AttributeKind::Charisma => "charisma",
        }
    }

    /// Position in [`AttributeKind::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        AttributeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| {
                CoreError::ValidationError(format!(
                    "Attribute must be one of: {}",
                    AttributeKind::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

/// Is `name` one of the six recognised attribute names (case-insensitive)?
pub fn is_attribute_name(name: &str) -> bool {
    name.parse::<AttributeKind>().is_ok()
}

/// `IF NOT EXISTS` uniqueness constraints backing every id lookup and the
/// one-completion-per-habit-per-day rule. Safe to run on every start.
pub fn constraint_statements() -> Vec<String> {
    let single = [
        ("character_id_unique", label::CHARACTER, character::ID),
        ("attribute_id_unique", label::ATTRIBUTE, attribute::ID),
        ("habit_id_unique", label::HABIT, habit::ID),
        ("completion_id_unique", label::COMPLETION, completion::ID),
    ];

    let mut statements: Vec<String> = single
        .iter()
        .map(|(name, label, key)| {
            format!(
                "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{label}) REQUIRE n.{key} IS UNIQUE"
            )
        })
        .collect();
    statements.push(format!(
        "CREATE CONSTRAINT completion_per_day_unique IF NOT EXISTS FOR (n:{label}) REQUIRE (n.{habit_id}, n.{date}) IS UNIQUE",
        label = label::COMPLETION,
        habit_id = completion::HABIT_ID,
        date = completion::DATE,
    ));
    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constraint_statements() {
        let statements = constraint_statements();
        assert_eq!(statements.len(), 5);
        assert_eq!(
            statements[0],
            "CREATE CONSTRAINT character_id_unique IF NOT EXISTS FOR (n:Character) REQUIRE n.character_id IS UNIQUE"
        );
        assert_eq!(
            statements[4],
            "CREATE CONSTRAINT completion_per_day_unique IF NOT EXISTS FOR (n:Completion) REQUIRE (n.habit_id, n.completion_date) IS UNIQUE"
        );
        assert!(statements.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[test]
    fn test_attribute_names() {
        assert!(is_attribute_name("strength"));
        assert!(is_attribute_name(" Wisdom "));
        assert!(!is_attribute_name("luck"));
        assert!(!is_attribute_name(""));
    }

    #[test]
    fn test_canonical_order_matches_index() {
        for (idx, kind) in AttributeKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), idx);
            assert_eq!(kind.as_str().parse::<AttributeKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_unknown_attribute_is_validation_error() {
        let err = "luck".parse::<AttributeKind>().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(msg) if msg.contains("charisma")));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&AttributeKind::Constitution).unwrap();
        assert_eq!(json, "\"constitution\"");
    }
}
