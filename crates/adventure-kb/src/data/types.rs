//! Basic value types exchanged with the graph store

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single property value as sent to or received from the graph store.
///
/// The store only ever holds scalars and lists of scalars, so this is a much
/// smaller type than a general JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphValue {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    List(Vec<GraphValue>),
}

/// One result row, keyed by column name.
pub type Row = HashMap<String, GraphValue>;

impl GraphValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GraphValue::Integer(i) => Some(*i),
            // Older vertices were written with numbers stored as strings
            GraphValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GraphValue::Null)
    }

    /// Helper to convert a GraphValue to Json, used for logging rows
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            GraphValue::Null => serde_json::Value::Null,
            GraphValue::Bool(b) => serde_json::Value::Bool(*b),
            GraphValue::Integer(i) => serde_json::json!(i),
            GraphValue::String(s) => serde_json::Value::String(s.clone()),
            GraphValue::List(items) => {
                serde_json::Value::Array(items.iter().map(GraphValue::to_json).collect())
            }
        }
    }
}

impl fmt::Display for GraphValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphValue::Null => write!(f, "null"),
            GraphValue::Bool(b) => write!(f, "{}", b),
            GraphValue::Integer(i) => write!(f, "{}", i),
            GraphValue::String(s) => write!(f, "'{}'", s),
            GraphValue::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for GraphValue {
    fn from(s: &str) -> Self {
        GraphValue::String(s.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(s: String) -> Self {
        GraphValue::String(s)
    }
}

impl From<i64> for GraphValue {
    fn from(i: i64) -> Self {
        GraphValue::Integer(i)
    }
}

impl From<bool> for GraphValue {
    fn from(b: bool) -> Self {
        GraphValue::Bool(b)
    }
}

impl From<GraphValue> for serde_json::Value {
    fn from(value: GraphValue) -> Self {
        value.to_json()
    }
}
