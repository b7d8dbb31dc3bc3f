//! Batch scaling of ingredient masses.
//!
//! Stored masses correspond to the recipe's baseline `times`. Display and
//! export masses for a requested multiplier `k` are
//! `mass × (k / times)`; stored values are never touched.

use crate::error::{RecipeResult, ValidationError};
use crate::models::{Ingredient, Recipe, RecipeTree, StepId};
use crate::thermal::total_mass_of;
use crate::validation::ensure_valid;

/// Scaled mass of a single ingredient.
///
/// `multiplier ≤ 0` is rejected, not clamped.
pub fn scaled_mass(
    ingredient: &Ingredient,
    multiplier: f64,
    recipe: &Recipe,
) -> Result<f64, ValidationError> {
    Ok(ScalingEngine::new(recipe, multiplier)?.scaled_mass(ingredient))
}

/// Scales masses from a recipe's baseline to a requested multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingEngine {
    multiplier: f64,
    factor: f64,
}

impl ScalingEngine {
    /// Creates an engine for `multiplier` batches of `recipe`.
    pub fn new(recipe: &Recipe, multiplier: f64) -> Result<Self, ValidationError> {
        if !multiplier.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "multiplier" });
        }
        if multiplier <= 0.0 {
            return Err(ValidationError::NonPositiveMultiplier { multiplier });
        }
        recipe.validate()?;
        Ok(Self {
            multiplier,
            factor: multiplier / recipe.times,
        })
    }

    /// Creates an engine at the recipe's own baseline (factor 1).
    pub fn baseline(recipe: &Recipe) -> Result<Self, ValidationError> {
        Self::new(recipe, recipe.times)
    }

    /// Requested multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// `multiplier / times`.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Scales a raw mass (g).
    #[inline]
    pub fn scale(&self, mass: f64) -> f64 {
        mass * self.factor
    }

    /// Scaled mass of an ingredient (g).
    pub fn scaled_mass(&self, ingredient: &Ingredient) -> f64 {
        self.scale(ingredient.mass)
    }

    /// Scaled total mass of a step's subtree (g).
    pub fn scaled_step_mass(&self, tree: &RecipeTree, step_id: StepId) -> RecipeResult<f64> {
        ensure_valid(tree)?;
        Ok(self.scale(total_mass_of(tree, step_id)?))
    }
}

/// Renders a mass in grams: at most two decimals, trailing zeros trimmed.
///
/// ```
/// use u_bake::scaling::format_mass;
///
/// assert_eq!(format_mass(500.0), "500 g");
/// assert_eq!(format_mass(12.5), "12.5 g");
/// assert_eq!(format_mass(1.0 / 3.0), "0.33 g");
/// ```
pub fn format_mass(grams: f64) -> String {
    let fixed = format!("{grams:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    format!("{trimmed} g")
}
