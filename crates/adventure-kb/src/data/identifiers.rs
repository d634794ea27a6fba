//! Identifier types for graph vertices

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::data::errors::CoreError;

macro_rules! vertex_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Name of the entity this id refers to, used in NotFound errors.
            pub const ENTITY: &'static str = $entity;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| CoreError::ValidationError(format!("Invalid {} id: {}", $entity, s)))
            }
        }
    };
}

vertex_id!(
    /// Unique identifier of a Character vertex.
    CharacterId,
    "Character"
);

vertex_id!(
    /// Unique identifier of an Attribute vertex.
    AttributeId,
    "Attribute"
);

vertex_id!(
    /// Unique identifier of a Habit vertex.
    HabitId,
    "Habit"
);

vertex_id!(
    /// Unique identifier of a Completion vertex.
    CompletionId,
    "Completion"
);
