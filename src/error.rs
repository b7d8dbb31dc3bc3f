//! Error types for recipe construction, validation, and interchange.
//!
//! Two families of failures exist:
//! - [`ValidationError`]: a single value is out of range (negative duration,
//!   negative mass, non-positive batch size). Raised at construction time.
//! - [`StructuralError`]: the step graph is not a forest of strict trees,
//!   or an id does not resolve. Raised before scheduling.
//!
//! [`RecipeError`] wraps both, plus interchange and configuration failures.

use thiserror::Error;

use crate::models::{IngredientId, StepId};

/// Result type for fallible recipe operations.
pub type RecipeResult<T> = Result<T, RecipeError>;

/// A value that violates a construction-time invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `duration` is below zero.
    #[error("step '{step}': field `duration` must not be negative (got {duration_ms} ms)")]
    NegativeDuration { step: String, duration_ms: i64 },

    /// `mass` is below zero.
    #[error("ingredient '{ingredient}': field `mass` must not be negative (got {mass})")]
    NegativeMass { ingredient: String, mass: f64 },

    /// `times` is zero or negative.
    #[error("recipe '{recipe}': field `times` must be positive (got {times})")]
    NonPositiveTimes { recipe: String, times: f64 },

    /// Requested batch multiplier is zero or negative.
    #[error("field `multiplier` must be positive (got {multiplier})")]
    NonPositiveMultiplier { multiplier: f64 },

    /// NaN or infinite numeric input.
    #[error("field `{field}` must be a finite number")]
    NonFiniteValue { field: &'static str },

    /// Numeric input outside its accepted range.
    #[error("field `{field}` is out of range (got {value})")]
    OutOfRange { field: &'static str, value: i64 },

    /// A dynamic-temperature step lacks its start or end temperature.
    #[error("step '{step}': dynamic temperature needs both `startTemp` and `endTemp`")]
    IncompleteTemperatureRamp { step: String },

    /// `strftime` pattern that chrono cannot render.
    #[error("field `time_format` is not a valid strftime pattern: {0:?}")]
    InvalidTimeFormat(String),
}

/// The step graph does not form a valid forest of strict trees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// No step with this id exists in the arena.
    #[error("unknown step {0}")]
    UnknownStep(StepId),

    /// No ingredient with this id exists in the arena.
    #[error("unknown ingredient {0}")]
    UnknownIngredient(IngredientId),

    /// A step lists a substep id that is not in the arena.
    #[error("step {parent} references missing substep {child}")]
    DanglingSubstep { parent: StepId, child: StepId },

    /// The recipe lists a top-level step id that is not in the arena.
    #[error("recipe references missing step {0}")]
    DanglingTopLevel(StepId),

    /// A step lists an ingredient id that is not in the arena.
    #[error("step {step} references missing ingredient {ingredient}")]
    DanglingIngredient { step: StepId, ingredient: IngredientId },

    /// Following substep links from this step leads back to it.
    #[error("circular substep reference involving step {0}")]
    Cycle(StepId),

    /// A step is the substep of more than one parent.
    #[error("step {step} has more than one parent ({first} and {second})")]
    MultipleParents {
        step: StepId,
        first: StepId,
        second: StepId,
    },

    /// An ingredient is listed by more than one step.
    #[error("ingredient {ingredient} is shared by steps {first} and {second}")]
    SharedIngredient {
        ingredient: IngredientId,
        first: StepId,
        second: StepId,
    },

    /// The recipe lists the same top-level step twice.
    #[error("step {0} appears more than once in the recipe's step list")]
    DuplicateTopLevel(StepId),
}

/// Any failure raised by this crate.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// Interchange document could not be parsed or written.
    #[error("interchange error: {0}")]
    Interchange(#[from] serde_json::Error),

    /// Embedded image data is not valid base64.
    #[error("invalid image data: {0}")]
    ImageData(#[from] base64::DecodeError),

    /// Configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl RecipeError {
    /// Whether this error is a value-level validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this error is a tree-structure failure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural(_))
    }
}
