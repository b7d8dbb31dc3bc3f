//! Recipe domain models.
//!
//! A recipe owns an ordered line of top-level steps. Each step owns its
//! ingredients and may own substeps, which run in parallel with their
//! siblings and must be ready when the parent's own work begins.
//!
//! # Domain Mappings
//!
//! | u-bake | Scheduling term | Example |
//! |--------|-----------------|---------|
//! | Recipe | Project | Sourdough loaf |
//! | Step | Activity | Bulk fermentation |
//! | Substep | Parallel sub-process | Levain build, soaker |
//! | Ingredient | Material | Flour, water |
//! | RecipeSchedule | Schedule | Timestamped bake plan |
//!
//! Storage is an arena ([`RecipeTree`]) addressed by stable ids.

mod ids;
mod ingredient;
mod recipe;
mod schedule;
mod step;
mod tree;

pub use ids::{IngredientId, RecipeId, StepId};
pub use ingredient::{Ingredient, IngredientStyle};
pub use recipe::{Difficulty, Recipe};
pub use schedule::{RecipeSchedule, StepTiming};
pub use step::Step;
pub use tree::RecipeTree;
