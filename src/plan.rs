//! Plan text export.
//!
//! Walks the scheduled tree and renders a deterministic, plain-text bake
//! plan:
//!
//! ```text
//! {step} {start}
//! \t{ingredient}: {scaled mass}[ {temp}° C]
//! \t{substep}: {scaled combined mass} {temp}° C
//! \t{notes}
//! Finished: {finish}
//! ```
//!
//! The temperature suffix is only printed for bulk liquids. Notes are
//! only printed when non-empty.

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::ScheduleConfig;
use crate::error::{RecipeResult, StructuralError};
use crate::models::RecipeTree;
use crate::scaling::{format_mass, ScalingEngine};
use crate::scheduler::ScheduleCalculator;
use crate::thermal::ThermalBalancer;
use crate::validation::ensure_valid;

/// Renders bake plans with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct PlanWriter {
    config: ScheduleConfig,
}

impl PlanWriter {
    /// Creates a writer.
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Renders the plan for `tree` from its own anchor.
    pub fn render(&self, tree: &RecipeTree) -> RecipeResult<String> {
        self.config.validate()?;
        ensure_valid(tree)?;

        let recipe = tree.recipe();
        let offset = self.config.offset()?;
        let multiplier = self.config.multiplier.unwrap_or(recipe.times);
        let scaling = ScalingEngine::new(recipe, multiplier)?;
        let balancer = ThermalBalancer::from_config(&self.config);
        let schedule = ScheduleCalculator::from_config(&self.config).schedule(tree)?;

        let mut lines = Vec::new();
        for step in tree.top_level_steps()? {
            let timing = schedule
                .timing_for_step(step.id)
                .ok_or(StructuralError::UnknownStep(step.id))?;
            lines.push(format!("{} {}", step.name, self.timestamp(timing.start, &offset)));

            for ingredient in tree.ingredients(step.id)? {
                let mass = format_mass(scaling.scaled_mass(ingredient));
                if ingredient.is_bulk_liquid() {
                    let temp = balancer.ingredient_temperature(tree, step.id, ingredient)?;
                    lines.push(format!("\t{}: {} {:.1}° C", ingredient.name, mass, temp));
                } else {
                    lines.push(format!("\t{}: {}", ingredient.name, mass));
                }
            }

            for child in tree.children(step.id)? {
                let mass = format_mass(scaling.scaled_step_mass(tree, child.id)?);
                lines.push(format!(
                    "\t{}: {} {}° C",
                    child.name,
                    mass,
                    child.resolved_temperature()
                ));
            }

            if !step.notes.trim().is_empty() {
                lines.push(format!("\t{}", step.notes));
            }
        }
        lines.push(format!(
            "Finished: {}",
            self.timestamp(schedule.finish, &offset)
        ));

        tracing::debug!(
            recipe = %recipe.name,
            multiplier,
            lines = lines.len(),
            "rendered plan text"
        );
        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }

    fn timestamp(&self, instant: DateTime<Utc>, offset: &FixedOffset) -> String {
        instant
            .with_timezone(offset)
            .format(&self.config.time_format)
            .to_string()
    }
}

/// Renders a plan with the given configuration.
pub fn render_plan(tree: &RecipeTree, config: &ScheduleConfig) -> RecipeResult<String> {
    PlanWriter::new(config.clone()).render(tree)
}
