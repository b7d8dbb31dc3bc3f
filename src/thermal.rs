//! Thermal balance for bulk-liquid ingredients.
//!
//! The target temperature of a step is treated as the mass-weighted mean
//! temperature of everything combined in it (uniform specific heat):
//!
//! ```text
//! fixedMass   = Σ mass(non-bulk) + Σ totalMass(child)
//! weightedSum = Σ mass(non-bulk)·room + Σ totalMass(child)·resolvedTemp(child)
//! X           = (target·(fixedMass + bulkMass) − weightedSum) / bulkMass
//! ```
//!
//! `resolvedTemp(child)` is the child's end temperature for dynamic
//! steps, its target temperature otherwise. With `bulkMass == 0` there is
//! nothing to balance and the room temperature is returned.
//!
//! A bulk liquid with a fixed temperature override is not solved for; it
//! joins the fixed side at its own temperature. Several solvable bulk
//! liquids are pooled and share one temperature.

use serde::{Deserialize, Serialize};

use crate::config::ScheduleConfig;
use crate::error::{RecipeResult, StructuralError};
use crate::models::{Ingredient, RecipeTree, StepId};
use crate::validation::ensure_valid;

/// Thermal summary of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalReport {
    pub step_id: StepId,
    /// Target mixture temperature (°C).
    pub target_temperature: i32,
    /// Everything in the step, bulk liquids and substeps included (g).
    pub total_mass: f64,
    /// Mass of the bulk liquids whose temperature is solved for (g).
    pub bulk_mass: f64,
    /// Solved bulk-liquid temperature; `None` if the step has no
    /// solvable bulk liquid.
    pub required_temperature: Option<f64>,
}

/// Solves bulk-liquid temperatures at a given room temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalBalancer {
    room_temperature: f64,
}

/// Terms of the balance equation for one step.
#[derive(Debug, Clone, Copy, Default)]
struct Balance {
    fixed_mass: f64,
    weighted_sum: f64,
    bulk_mass: f64,
}

impl ThermalBalancer {
    /// Creates a balancer for the given room temperature (°C).
    pub fn new(room_temperature: f64) -> Self {
        Self { room_temperature }
    }

    /// Creates a balancer from configuration.
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.room_temperature)
    }

    /// The room temperature used for non-bulk ingredients (°C).
    pub fn room_temperature(&self) -> f64 {
        self.room_temperature
    }

    /// Bulk-liquid temperature that brings the step to its target (°C).
    pub fn required_temperature(&self, tree: &RecipeTree, step_id: StepId) -> RecipeResult<f64> {
        ensure_valid(tree)?;
        Ok(self.solve(tree, step_id)?)
    }

    /// Temperature an ingredient of `step_id` counts at in the balance (°C).
    ///
    /// A bulk liquid with a fixed temperature keeps it; a solvable bulk
    /// liquid gets the solved temperature. Every other ingredient is at
    /// room temperature, even when it carries a temperature of its own.
    pub fn ingredient_temperature(
        &self,
        tree: &RecipeTree,
        step_id: StepId,
        ingredient: &Ingredient,
    ) -> RecipeResult<f64> {
        match (ingredient.is_bulk_liquid(), ingredient.temperature) {
            (true, Some(fixed)) => Ok(f64::from(fixed)),
            (true, None) => self.required_temperature(tree, step_id),
            (false, _) => Ok(self.room_temperature),
        }
    }

    /// Total mass of a step: all of its ingredients plus its substeps'
    /// total masses, recursively (g).
    pub fn total_mass(&self, tree: &RecipeTree, step_id: StepId) -> RecipeResult<f64> {
        ensure_valid(tree)?;
        Ok(total_mass_of(tree, step_id)?)
    }

    /// One report per step in the tree, ordered by step id.
    pub fn balance_recipe(&self, tree: &RecipeTree) -> RecipeResult<Vec<ThermalReport>> {
        ensure_valid(tree)?;
        let mut reports = Vec::with_capacity(tree.step_count());
        for step in tree.steps() {
            let balance = self.balance(tree, step.id)?;
            let required_temperature = if balance.bulk_mass > 0.0 {
                Some(self.solve_balance(step.temperature, &balance))
            } else {
                None
            };
            reports.push(ThermalReport {
                step_id: step.id,
                target_temperature: step.temperature,
                total_mass: balance.fixed_mass + balance.bulk_mass,
                bulk_mass: balance.bulk_mass,
                required_temperature,
            });
        }
        Ok(reports)
    }

    fn solve(&self, tree: &RecipeTree, step_id: StepId) -> Result<f64, StructuralError> {
        let step = tree.step(step_id)?;
        let balance = self.balance(tree, step_id)?;
        if balance.bulk_mass == 0.0 {
            tracing::trace!(step = %step.name, "no bulk liquid mass; using room temperature");
            return Ok(self.room_temperature);
        }
        let required = self.solve_balance(step.temperature, &balance);
        tracing::debug!(
            step = %step.name,
            target = step.temperature,
            bulk_mass = balance.bulk_mass,
            required,
            "balanced bulk liquid"
        );
        Ok(required)
    }

    fn solve_balance(&self, target: i32, balance: &Balance) -> f64 {
        let target = f64::from(target);
        (target * (balance.fixed_mass + balance.bulk_mass) - balance.weighted_sum)
            / balance.bulk_mass
    }

    fn balance(&self, tree: &RecipeTree, step_id: StepId) -> Result<Balance, StructuralError> {
        let mut b = Balance::default();
        for ingredient in tree.ingredients(step_id)? {
            match (ingredient.is_bulk_liquid(), ingredient.temperature) {
                (true, None) => b.bulk_mass += ingredient.mass,
                (true, Some(fixed)) => {
                    b.fixed_mass += ingredient.mass;
                    b.weighted_sum += ingredient.mass * f64::from(fixed);
                }
                (false, _) => {
                    b.fixed_mass += ingredient.mass;
                    b.weighted_sum += ingredient.mass * self.room_temperature;
                }
            }
        }
        for child in tree.children(step_id)? {
            let mass = total_mass_of(tree, child.id)?;
            b.fixed_mass += mass;
            b.weighted_sum += mass * f64::from(child.resolved_temperature());
        }
        Ok(b)
    }
}

impl Default for ThermalBalancer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ROOM_TEMPERATURE)
    }
}

/// Total mass of a step's subtree. The tree must be acyclic.
pub(crate) fn total_mass_of(tree: &RecipeTree, step_id: StepId) -> Result<f64, StructuralError> {
    let own: f64 = tree.ingredients(step_id)?.iter().map(|i| i.mass).sum();
    let mut total = own;
    for child in tree.children(step_id)? {
        total += total_mass_of(tree, child.id)?;
    }
    Ok(total)
}
