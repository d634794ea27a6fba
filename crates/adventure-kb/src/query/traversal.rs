//! Structured traversal values handed to a [`GraphStore`](crate::traits::GraphStore).

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::data::{errors::StateStoreError, types::GraphValue};

/// The domain operation a traversal performs.
///
/// Stores that speak a query language execute [`Traversal::statement`];
/// stores that do not (the in-memory store) dispatch on this tag and read
/// the same parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TraversalOp {
    CreateCharacter,
    GetCharacter,
    ListCharacters,
    UpdateAttributeScore,
    DeleteCharacter,
    GetAttribute,
    CreateHabit,
    GetHabit,
    DeleteHabit,
    RecordCompletion,
    RemoveCompletion,
    CompletionsBetween,
    AdjustHitPoints,
}

impl TraversalOp {
    pub fn name(&self) -> &'static str {
        match self {
            TraversalOp::CreateCharacter => "create_character",
            TraversalOp::GetCharacter => "get_character",
            TraversalOp::ListCharacters => "list_characters",
            TraversalOp::UpdateAttributeScore => "update_attribute_score",
            TraversalOp::DeleteCharacter => "delete_character",
            TraversalOp::GetAttribute => "get_attribute",
            TraversalOp::CreateHabit => "create_habit",
            TraversalOp::GetHabit => "get_habit",
            TraversalOp::DeleteHabit => "delete_habit",
            TraversalOp::RecordCompletion => "record_completion",
            TraversalOp::RemoveCompletion => "remove_completion",
            TraversalOp::CompletionsBetween => "completions_between",
            TraversalOp::AdjustHitPoints => "adjust_hit_points",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            TraversalOp::GetCharacter
                | TraversalOp::ListCharacters
                | TraversalOp::GetAttribute
                | TraversalOp::GetHabit
                | TraversalOp::CompletionsBetween
        )
    }
}

impl fmt::Display for TraversalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully built, parameterised unit of work against the graph.
///
/// The statement text is assembled only from schema constants; every value
/// that came from a caller is carried in `params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Traversal {
    pub op: TraversalOp,
    pub statement: String,
    pub params: BTreeMap<String, GraphValue>,
    /// Result columns, in `RETURN` order.
    pub columns: Vec<&'static str>,
}

impl Traversal {
    pub fn new(op: TraversalOp, statement: impl Into<String>) -> Self {
        Self {
            op,
            statement: statement.into(),
            params: BTreeMap::new(),
            columns: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<GraphValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn returning(mut self, columns: &[&'static str]) -> Self {
        self.columns = columns.to_vec();
        self
    }

    pub fn get_param(&self, key: &str) -> Option<&GraphValue> {
        self.params.get(key)
    }

    /// String parameter, or an `InvalidInput` error naming the traversal.
    pub fn require_str(&self, key: &str) -> Result<&str, StateStoreError> {
        self.get_param(key)
            .and_then(GraphValue::as_str)
            .ok_or_else(|| {
                StateStoreError::InvalidInput(format!(
                    "{} is missing string parameter '{}'",
                    self.op, key
                ))
            })
    }

    /// Integer parameter, or an `InvalidInput` error naming the traversal.
    pub fn require_i64(&self, key: &str) -> Result<i64, StateStoreError> {
        match self.get_param(key) {
            Some(GraphValue::Integer(i)) => Ok(*i),
            _ => Err(StateStoreError::InvalidInput(format!(
                "{} is missing integer parameter '{}'",
                self.op, key
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_and_columns() {
        let traversal = Traversal::new(TraversalOp::GetHabit, "MATCH (h) RETURN h.habit_id AS habit_id")
            .param("habit_id", "h-1")
            .param("limit", 3i64)
            .returning(&["habit_id"]);

        assert_eq!(traversal.require_str("habit_id").unwrap(), "h-1");
        assert_eq!(traversal.require_i64("limit").unwrap(), 3);
        assert_eq!(traversal.get_param("limit"), Some(&GraphValue::Integer(3)));
        assert_eq!(traversal.get_param("offset"), None);
        assert_eq!(traversal.columns, vec!["habit_id"]);
    }

    #[test]
    fn test_missing_param_names_the_op() {
        let traversal = Traversal::new(TraversalOp::DeleteHabit, "");
        let err = traversal.require_str("habit_id").unwrap_err();
        assert!(err.to_string().contains("delete_habit"));
        assert!(traversal.require_i64("habit_id").is_err());
    }

    #[test]
    fn test_mutation_flags() {
        assert!(TraversalOp::RecordCompletion.is_mutation());
        assert!(TraversalOp::DeleteCharacter.is_mutation());
        assert!(!TraversalOp::ListCharacters.is_mutation());
    }
}
