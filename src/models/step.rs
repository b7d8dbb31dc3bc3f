//! Step model.
//!
//! A step is a unit of work with a duration and a target temperature. It
//! owns its ingredients and, optionally, substeps: sub-processes (e.g. a
//! preferment) that run in parallel with their siblings and must be ready
//! when the step's own work begins.

use serde::{Deserialize, Serialize};

use super::{IngredientId, StepId};
use crate::error::ValidationError;

/// A recipe step.
///
/// # Time Representation
/// Durations are in milliseconds. A duration of 0 is a legal,
/// instantaneous marker step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Stable identifier (assigned by the arena).
    pub id: StepId,
    /// Display name.
    pub name: String,
    /// Own work time (ms), excluding substeps.
    pub duration_ms: i64,
    /// Target temperature of the step's mixture (°C).
    pub temperature: i32,
    /// Temperature at the start of a ramp (°C).
    pub start_temp: Option<i32>,
    /// Temperature at the end of a ramp (°C).
    pub end_temp: Option<i32>,
    /// Free-text notes.
    pub notes: String,
    /// Ingredients, in authoring order.
    pub ingredients: Vec<IngredientId>,
    /// Substeps, in authoring order.
    pub substeps: Vec<StepId>,
}

impl Step {
    /// Creates a step, rejecting negative durations.
    pub fn new(name: impl Into<String>, duration_ms: i64) -> Result<Self, ValidationError> {
        let name = name.into();
        check_duration(&name, duration_ms)?;
        Ok(Self {
            id: StepId(0),
            name,
            duration_ms,
            temperature: 20,
            start_temp: None,
            end_temp: None,
            notes: String::new(),
            ingredients: Vec::new(),
            substeps: Vec::new(),
        })
    }

    /// Creates a step from a duration in minutes.
    pub fn minutes(name: impl Into<String>, minutes: i64) -> Result<Self, ValidationError> {
        let duration_ms = minutes
            .checked_mul(60_000)
            .ok_or(ValidationError::OutOfRange {
                field: "duration",
                value: minutes,
            })?;
        Self::new(name, duration_ms)
    }

    /// Creates a step from a duration in (fractional) seconds, rounded to
    /// whole milliseconds.
    ///
    /// The sign is checked before rounding, so any negative input is
    /// rejected, and values beyond `i64` milliseconds are out of range.
    pub fn seconds(name: impl Into<String>, seconds: f64) -> Result<Self, ValidationError> {
        let name = name.into();
        if !seconds.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "duration" });
        }
        let ms = seconds * 1000.0;
        if seconds < 0.0 {
            return Err(ValidationError::NegativeDuration {
                step: name,
                duration_ms: (ms.floor() as i64).min(-1),
            });
        }
        // 2^63 is exactly representable; anything at or above it overflows.
        if ms.round() >= i64::MAX as f64 {
            return Err(ValidationError::OutOfRange {
                field: "duration",
                value: i64::MAX,
            });
        }
        Self::new(name, ms.round() as i64)
    }

    /// Sets the target temperature.
    pub fn with_temperature(mut self, temperature: i32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Makes this a dynamic-temperature step ramping from `start` to `end`.
    pub fn with_dynamic_temperature(mut self, start: i32, end: i32) -> Self {
        self.start_temp = Some(start);
        self.end_temp = Some(end);
        self
    }

    /// Sets the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Replaces the duration, with the same checks as [`Step::new`].
    pub fn with_duration(mut self, duration_ms: i64) -> Result<Self, ValidationError> {
        check_duration(&self.name, duration_ms)?;
        self.duration_ms = duration_ms;
        Ok(self)
    }

    /// Whether the step ramps its temperature over its duration.
    #[inline]
    pub fn is_dynamic_temperature(&self) -> bool {
        self.start_temp.is_some() && self.end_temp.is_some()
    }

    /// Temperature of this step's mixture when it is folded into a parent.
    ///
    /// Dynamic steps contribute their end temperature.
    pub fn resolved_temperature(&self) -> i32 {
        match (self.is_dynamic_temperature(), self.end_temp) {
            (true, Some(end)) => end,
            _ => self.temperature,
        }
    }

    /// Whether this step has substeps.
    #[inline]
    pub fn has_substeps(&self) -> bool {
        !self.substeps.is_empty()
    }

    /// Re-checks the value invariants (used after deserialization).
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_duration(&self.name, self.duration_ms)
    }
}

fn check_duration(name: &str, duration_ms: i64) -> Result<(), ValidationError> {
    if duration_ms < 0 {
        return Err(ValidationError::NegativeDuration {
            step: name.to_string(),
            duration_ms,
        });
    }
    Ok(())
}
