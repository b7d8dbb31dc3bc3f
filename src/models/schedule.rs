//! Schedule (solution) model.
//!
//! A recipe schedule assigns absolute timestamps to every step in the
//! tree. Each step's own work runs over `[start, end)`; a step with
//! substeps must have its whole subtree initiated at `initiate_at`, which
//! is `lead_time` before `end`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::StepId;

/// Timestamps assigned to a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
    /// Scheduled step.
    pub step_id: StepId,
    /// Parent step, `None` for the top-level line.
    pub parent_id: Option<StepId>,
    /// Start of the step's own work.
    ///
    /// For a substep that has substeps of its own this is later than
    /// [`initiate_at`](Self::initiate_at), which is when the baker has to
    /// begin the whole subtree. For leaf steps the two are equal.
    pub start: DateTime<Utc>,
    /// End of the step's own work (`start + duration`).
    pub end: DateTime<Utc>,
    /// Instant the step's subtree must be initiated (`end − lead_time`).
    pub initiate_at: DateTime<Utc>,
    /// Duration plus the longest substep lead time (ms).
    pub lead_time_ms: i64,
    /// Position among siblings: initiation order for substeps, line
    /// position for top-level steps.
    pub sequence: usize,
}

impl StepTiming {
    /// Own work duration (ms).
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    /// Whether this is a top-level step.
    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A complete recipe schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSchedule {
    /// The anchor instant the schedule was computed from.
    pub anchor: DateTime<Utc>,
    /// Whether the anchor is the finish instant.
    pub inverted: bool,
    /// Start of the first top-level step.
    pub first_start: DateTime<Utc>,
    /// End of the last top-level step.
    pub finish: DateTime<Utc>,
    /// One entry per step: each top-level step followed by its subtree in
    /// initiation order (depth-first).
    pub timings: Vec<StepTiming>,
}

impl RecipeSchedule {
    /// Creates an empty schedule where everything happens at `anchor`.
    pub fn empty(anchor: DateTime<Utc>, inverted: bool) -> Self {
        Self {
            anchor,
            inverted,
            first_start: anchor,
            finish: anchor,
            timings: Vec::new(),
        }
    }

    /// Adds a step timing.
    pub fn add_timing(&mut self, timing: StepTiming) {
        self.timings.push(timing);
    }

    /// Finds the timing for a step.
    pub fn timing_for_step(&self, step_id: StepId) -> Option<&StepTiming> {
        self.timings.iter().find(|t| t.step_id == step_id)
    }

    /// Timings of the top-level line, in execution order.
    pub fn top_level_timings(&self) -> Vec<&StepTiming> {
        self.timings.iter().filter(|t| t.is_top_level()).collect()
    }

    /// Timings of a step's substeps, in initiation order.
    pub fn substep_timings(&self, parent_id: StepId) -> Vec<&StepTiming> {
        self.timings
            .iter()
            .filter(|t| t.parent_id == Some(parent_id))
            .collect()
    }

    /// Earliest initiation instant anywhere in the tree.
    pub fn earliest_start(&self) -> DateTime<Utc> {
        self.timings
            .iter()
            .map(|t| t.initiate_at)
            .min()
            .unwrap_or(self.first_start)
    }

    /// Elapsed time from the earliest initiation to the finish.
    pub fn total_span(&self) -> TimeDelta {
        self.finish - self.earliest_start()
    }

    /// Elapsed time of the top-level line alone (first start to finish).
    pub fn line_span(&self) -> TimeDelta {
        self.finish - self.first_start
    }

    /// Number of scheduled steps.
    pub fn step_count(&self) -> usize {
        self.timings.len()
    }

    /// Whether no step was scheduled.
    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }
}
