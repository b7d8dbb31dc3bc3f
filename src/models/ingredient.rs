//! Ingredient model.

use serde::{Deserialize, Serialize};

use super::IngredientId;
use crate::error::ValidationError;

/// Ingredient category.
///
/// Only [`IngredientStyle::BulkLiquid`] has scheduling significance: its
/// temperature is solved for by the thermal balancer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IngredientStyle {
    /// Liquid whose temperature is tuned to hit the step's target.
    BulkLiquid,
    /// Flour (counts toward baker's percentages).
    Flour,
    /// Anything else.
    #[default]
    Ingredient,
}

/// An ingredient used by a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Stable identifier (assigned by the arena).
    pub id: IngredientId,
    /// Display name.
    pub name: String,
    /// Mass in grams at the recipe's baseline `times`.
    pub mass: f64,
    /// Category tag.
    pub style: IngredientStyle,
    /// Fixed temperature (°C). For bulk liquids this disables solving.
    pub temperature: Option<i32>,
}

impl Ingredient {
    /// Creates an ingredient, rejecting negative or non-finite masses.
    pub fn new(name: impl Into<String>, mass: f64) -> Result<Self, ValidationError> {
        let name = name.into();
        check_mass(&name, mass)?;
        Ok(Self {
            id: IngredientId(0),
            name,
            mass,
            style: IngredientStyle::default(),
            temperature: None,
        })
    }

    /// Shorthand for a bulk-liquid ingredient.
    pub fn bulk_liquid(name: impl Into<String>, mass: f64) -> Result<Self, ValidationError> {
        Ok(Self::new(name, mass)?.with_style(IngredientStyle::BulkLiquid))
    }

    /// Sets the style tag.
    pub fn with_style(mut self, style: IngredientStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets a fixed temperature override.
    pub fn with_temperature(mut self, temperature: i32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Replaces the mass, with the same checks as [`Ingredient::new`].
    pub fn with_mass(mut self, mass: f64) -> Result<Self, ValidationError> {
        check_mass(&self.name, mass)?;
        self.mass = mass;
        Ok(self)
    }

    /// Whether this ingredient's temperature is solved for.
    #[inline]
    pub fn is_bulk_liquid(&self) -> bool {
        self.style == IngredientStyle::BulkLiquid
    }

    /// Re-checks the value invariants (used after deserialization).
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_mass(&self.name, self.mass)
    }
}

fn check_mass(name: &str, mass: f64) -> Result<(), ValidationError> {
    if !mass.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "mass" });
    }
    if mass < 0.0 {
        return Err(ValidationError::NegativeMass {
            ingredient: name.to_string(),
            mass,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_builder() {
        let water = Ingredient::bulk_liquid("Water", 350.0)
            .unwrap()
            .with_temperature(30);
        assert_eq!(water.name, "Water");
        assert!(water.is_bulk_liquid());
        assert_eq!(water.temperature, Some(30));

        let flour = Ingredient::new("Flour", 500.0)
            .unwrap()
            .with_style(IngredientStyle::Flour);
        assert!(!flour.is_bulk_liquid());
    }

    #[test]
    fn test_negative_mass_rejected() {
        let err = Ingredient::new("Salt", -1.0).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeMass { .. }));

        let err = Ingredient::new("Salt", 10.0)
            .unwrap()
            .with_mass(-3.0)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NegativeMass { .. }));
    }

    #[test]
    fn test_non_finite_mass_rejected() {
        let err = Ingredient::new("Salt", f64::NAN).unwrap_err();
        assert_eq!(err, ValidationError::NonFiniteValue { field: "mass" });
    }

    #[test]
    fn test_zero_mass_is_legal() {
        assert!(Ingredient::new("Pinch", 0.0).is_ok());
    }

    #[test]
    fn test_style_serializes_camel_case() {
        let json = serde_json::to_string(&IngredientStyle::BulkLiquid).unwrap();
        assert_eq!(json, "\"bulkLiquid\"");
    }
}
