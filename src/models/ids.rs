//! Stable identifiers for arena entries.
//!
//! Ids survive edits: a saved step keeps its id, so schedule and thermal
//! results can be matched back to it after recomputation.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

arena_id!(
    /// Identifies a recipe.
    RecipeId
);
arena_id!(
    /// Identifies a step within a recipe tree.
    StepId
);
arena_id!(
    /// Identifies an ingredient within a recipe tree.
    IngredientId
);
