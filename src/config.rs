//! Explicit configuration for schedule, thermal, and plan computations.
//!
//! Every computation takes its environment (room temperature, batch
//! multiplier, display settings) from a [`ScheduleConfig`] value passed in
//! by the caller. There is no ambient or global state.
//!
//! # TOML
//!
//! ```
//! use u_bake::config::ScheduleConfig;
//!
//! let config = ScheduleConfig::from_toml_str(
//!     r#"
//!     room_temperature = 23.5
//!     multiplier = 3.0
//!     tie_break = "by_id"
//!     "#,
//! ).unwrap();
//! assert_eq!(config.room_temperature, 23.5);
//! ```

use chrono::format::{Item, StrftimeItems};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{RecipeResult, ValidationError};
use crate::scheduler::TieBreak;

/// Default room temperature (°C).
pub const DEFAULT_ROOM_TEMPERATURE: f64 = 20.0;

/// Default timestamp pattern for plan text.
pub const DEFAULT_TIME_FORMAT: &str = "%d.%m.%Y, %H:%M";

/// Inputs shared by the scheduler, the thermal balancer, and the plan writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Temperature of everything that is not a bulk liquid or a substep (°C).
    pub room_temperature: f64,
    /// Requested batch multiplier. `None` = the recipe's own `times`.
    pub multiplier: Option<f64>,
    /// `strftime` pattern for plan timestamps.
    pub time_format: String,
    /// Offset from UTC (minutes) at which timestamps are displayed.
    pub utc_offset_minutes: i32,
    /// Ordering of substeps with equal lead time.
    pub tie_break: TieBreak,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            room_temperature: DEFAULT_ROOM_TEMPERATURE,
            multiplier: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            utc_offset_minutes: 0,
            tie_break: TieBreak::default(),
        }
    }
}

impl ScheduleConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> RecipeResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        tracing::debug!(?config, "loaded schedule configuration");
        Ok(config)
    }

    /// Sets the room temperature.
    pub fn with_room_temperature(mut self, celsius: f64) -> Self {
        self.room_temperature = celsius;
        self
    }

    /// Sets the requested batch multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Sets the timestamp pattern.
    pub fn with_time_format(mut self, pattern: impl Into<String>) -> Self {
        self.time_format = pattern.into();
        self
    }

    /// Sets the display offset from UTC.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Sets the substep tie-break rule.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Display offset as a chrono [`FixedOffset`].
    pub fn offset(&self) -> Result<FixedOffset, ValidationError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ValidationError::OutOfRange {
                field: "utc_offset_minutes",
                value: i64::from(self.utc_offset_minutes),
            })
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.room_temperature.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "room_temperature",
            });
        }
        if let Some(multiplier) = self.multiplier {
            if !multiplier.is_finite() {
                return Err(ValidationError::NonFiniteValue { field: "multiplier" });
            }
            if multiplier <= 0.0 {
                return Err(ValidationError::NonPositiveMultiplier { multiplier });
            }
        }
        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(ValidationError::InvalidTimeFormat(self.time_format.clone()));
        }
        self.offset()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecipeError;

    #[test]
    fn test_defaults() {
        let config = ScheduleConfig::new();
        assert_eq!(config.room_temperature, DEFAULT_ROOM_TEMPERATURE);
        assert_eq!(config.multiplier, None);
        assert_eq!(config.tie_break, TieBreak::AuthoringOrder);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ScheduleConfig::new()
            .with_room_temperature(24.0)
            .with_multiplier(2.5)
            .with_time_format("%H:%M")
            .with_utc_offset_minutes(120)
            .with_tie_break(TieBreak::ById);

        assert_eq!(config.room_temperature, 24.0);
        assert_eq!(config.multiplier, Some(2.5));
        assert_eq!(config.offset().unwrap().local_minus_utc(), 7200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ScheduleConfig::from_toml_str("room_temperature = 18.0\n").unwrap();
        assert_eq!(config.room_temperature, 18.0);
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        let err = ScheduleConfig::from_toml_str("multiplier = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            RecipeError::Validation(ValidationError::NonPositiveMultiplier { .. })
        ));

        let err = ScheduleConfig::from_toml_str("room_temperature = \"warm\"\n").unwrap_err();
        assert!(matches!(err, RecipeError::Config(_)));
    }

    #[test]
    fn test_invalid_time_format() {
        let config = ScheduleConfig::new().with_time_format("%Q");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTimeFormat(_))
        ));
    }

    #[test]
    fn test_offset_out_of_range() {
        let config = ScheduleConfig::new().with_utc_offset_minutes(60 * 25);
        assert!(matches!(
            config.offset(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
