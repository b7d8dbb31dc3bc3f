//! Baking recipe planning for the U-Engine ecosystem.
//!
//! Turns a structured baking recipe into a time-stamped production plan
//! and tells the baker the liquid temperature needed to hit a target
//! dough temperature. Everything is a pure, synchronous function over an
//! immutable [`models::RecipeTree`] snapshot; callers own any threading.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Recipe`, `Step`, `Ingredient`, the
//!   `RecipeTree` arena, and the `RecipeSchedule` solution
//! - **`validation`**: Value and strict-tree checks (cycles, shared children)
//! - **`scheduler`**: Lead times, substep ordering, absolute timestamps
//! - **`thermal`**: Mass-weighted bulk-liquid temperature balance
//! - **`scaling`**: Batch-multiplier mass scaling
//! - **`interchange`**: JSON import/export of recipe trees
//! - **`plan`**: Deterministic plan text
//! - **`config`**: Explicit `ScheduleConfig` (room temperature, multiplier, display)
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use u_bake::config::ScheduleConfig;
//! use u_bake::models::{Ingredient, Recipe, RecipeTree, Step};
//! use u_bake::thermal::ThermalBalancer;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 6, 7, 0, 0).unwrap();
//! let mut tree = RecipeTree::new(Recipe::new("Focaccia").starting_at(start));
//! let mix = tree.push_step(Step::minutes("Mix", 10).unwrap().with_temperature(24));
//! tree.push_ingredient(mix, Ingredient::new("Flour", 500.0).unwrap()).unwrap();
//! tree.push_ingredient(mix, Ingredient::bulk_liquid("Water", 400.0).unwrap()).unwrap();
//!
//! let config = ScheduleConfig::new().with_room_temperature(20.0);
//! let water = ThermalBalancer::from_config(&config)
//!     .required_temperature(&tree, mix)
//!     .unwrap();
//! assert!((water - 29.0).abs() < 1e-9);
//!
//! let plan = u_bake::plan::render_plan(&tree, &config).unwrap();
//! assert!(plan.ends_with("Finished: 06.01.2024, 07:10\n"));
//! ```

pub mod config;
pub mod error;
pub mod interchange;
pub mod models;
pub mod plan;
pub mod scaling;
pub mod scheduler;
pub mod thermal;
pub mod validation;

pub use error::{RecipeError, RecipeResult, StructuralError, ValidationError};
