//! Recipe model.
//!
//! Holds recipe-level metadata, the batch baseline (`times`) and the
//! anchor instant the schedule is computed from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecipeId, StepId};
use crate::error::ValidationError;

/// Perceived difficulty of a recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// A baking recipe.
///
/// # Anchor
/// `date` is either the instant the first top-level step begins
/// (`inverted == false`) or the instant the recipe finishes
/// (`inverted == true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable identifier.
    pub id: RecipeId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub info: String,
    /// Perceived difficulty.
    pub difficulty: Difficulty,
    /// Batch baseline the stored masses correspond to. Always `> 0`.
    pub times: f64,
    /// Anchor instant.
    pub date: DateTime<Utc>,
    /// Whether `date` is the finish instant.
    pub inverted: bool,
    /// Session-only favourite flag.
    pub is_favourite: bool,
    /// Session-only "currently baking" flag.
    pub running: bool,
    /// Raw image bytes.
    pub image_data: Option<Vec<u8>>,
    /// Top-level steps, in execution order.
    pub steps: Vec<StepId>,
}

impl Recipe {
    /// Creates a recipe with `times = 1` anchored at the Unix epoch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecipeId(0),
            name: name.into(),
            info: String::new(),
            difficulty: Difficulty::default(),
            times: 1.0,
            date: DateTime::<Utc>::UNIX_EPOCH,
            inverted: false,
            is_favourite: false,
            running: false,
            image_data: None,
            steps: Vec::new(),
        }
    }

    /// Sets the id.
    pub fn with_id(mut self, id: RecipeId) -> Self {
        self.id = id;
        self
    }

    /// Sets the description.
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    /// Sets the difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the batch baseline, rejecting non-positive values.
    pub fn with_times(mut self, times: f64) -> Result<Self, ValidationError> {
        check_times(&self.name, times)?;
        self.times = times;
        Ok(self)
    }

    /// Anchors the schedule at the instant the first step begins.
    pub fn starting_at(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self.inverted = false;
        self
    }

    /// Anchors the schedule at the instant the recipe finishes.
    pub fn finishing_at(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self.inverted = true;
        self
    }

    /// Attaches image bytes.
    pub fn with_image_data(mut self, data: Vec<u8>) -> Self {
        self.image_data = Some(data);
        self
    }

    /// Re-checks the value invariants (used after deserialization).
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_times(&self.name, self.times)
    }
}

fn check_times(name: &str, times: f64) -> Result<(), ValidationError> {
    if !times.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "times" });
    }
    if times <= 0.0 {
        return Err(ValidationError::NonPositiveTimes {
            recipe: name.to_string(),
            times,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_recipe_builder() {
        let anchor = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let recipe = Recipe::new("Country loaf")
            .with_info("75% hydration")
            .with_difficulty(Difficulty::Medium)
            .with_times(2.0)
            .unwrap()
            .finishing_at(anchor);

        assert_eq!(recipe.name, "Country loaf");
        assert_eq!(recipe.difficulty, Difficulty::Medium);
        assert_eq!(recipe.times, 2.0);
        assert_eq!(recipe.date, anchor);
        assert!(recipe.inverted);

        let recipe = recipe.starting_at(anchor);
        assert!(!recipe.inverted);
    }

    #[test]
    fn test_non_positive_times_rejected() {
        assert!(matches!(
            Recipe::new("r").with_times(0.0),
            Err(ValidationError::NonPositiveTimes { .. })
        ));
        assert!(matches!(
            Recipe::new("r").with_times(-2.0),
            Err(ValidationError::NonPositiveTimes { .. })
        ));
        assert!(matches!(
            Recipe::new("r").with_times(f64::INFINITY),
            Err(ValidationError::NonFiniteValue { field: "times" })
        ));
    }
}
