//! Substep initiation ordering.
//!
//! All substeps of a parent must be ready at the same deadline `D` (the
//! parent's own start), but the baker initiates them one at a time.
//! Initiating the longest lead time first makes every initiation instant
//! chronologically consistent with the sequence and minimizes the earliest
//! required start:
//!
//! ```text
//! order:           descending lead time
//! initiate_at(Sᵢ): D − leadTime(Sᵢ)
//! ```
//!
//! Substeps are assumed to run unattended once initiated and to take no
//! time to initiate. This is a deadline-driven greedy, not an optimizer.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 3.2: LPT-style list scheduling

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::ValidationError;
use crate::models::StepId;

/// How substeps with equal lead time are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the order in which the substeps were authored (stable).
    #[default]
    AuthoringOrder,
    /// Ascending step id.
    ById,
}

/// A substep together with its recursively computed lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadTime {
    pub step_id: StepId,
    /// Duration plus longest substep lead time (ms).
    pub lead_time_ms: i64,
}

/// A substep's place in the initiation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstepSlot {
    pub step_id: StepId,
    pub lead_time_ms: i64,
    /// Position in the initiation sequence (0 = first).
    pub sequence: usize,
    /// `deadline − lead_time`.
    pub initiate_at: DateTime<Utc>,
}

/// Longest-lead-time-first ordering of sibling substeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderPolicy {
    tie_break: TieBreak,
}

impl ReorderPolicy {
    /// Creates a policy with the default (authoring order) tie-break.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tie-break rule.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// The configured tie-break rule.
    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Returns the substeps in initiation order.
    ///
    /// `substeps` must be in authoring order.
    pub fn order(&self, substeps: &[LeadTime]) -> Vec<LeadTime> {
        let mut ordered = substeps.to_vec();
        // sort_by is stable, so AuthoringOrder needs no extra key.
        ordered.sort_by(|a, b| self.compare(a, b));
        ordered
    }

    /// Orders substeps and assigns each an initiation instant so that all
    /// of them are ready at `deadline`.
    ///
    /// Fails with [`ValidationError::OutOfRange`] when an initiation instant
    /// falls outside the representable calendar.
    pub fn plan(
        &self,
        substeps: &[LeadTime],
        deadline: DateTime<Utc>,
    ) -> Result<Vec<SubstepSlot>, ValidationError> {
        self.order(substeps)
            .into_iter()
            .enumerate()
            .map(|(sequence, s)| {
                Ok(SubstepSlot {
                    step_id: s.step_id,
                    lead_time_ms: s.lead_time_ms,
                    sequence,
                    initiate_at: offset_ms(deadline, -s.lead_time_ms)?,
                })
            })
            .collect()
    }

    fn compare(&self, a: &LeadTime, b: &LeadTime) -> Ordering {
        match b.lead_time_ms.cmp(&a.lead_time_ms) {
            Ordering::Equal => match self.tie_break {
                TieBreak::AuthoringOrder => Ordering::Equal,
                TieBreak::ById => a.step_id.cmp(&b.step_id),
            },
            other => other,
        }
    }
}

/// `at + ms`, or `OutOfRange` when the result leaves chrono's calendar.
pub(crate) fn offset_ms(at: DateTime<Utc>, ms: i64) -> Result<DateTime<Utc>, ValidationError> {
    TimeDelta::try_milliseconds(ms)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or(ValidationError::OutOfRange {
            field: "duration",
            value: ms,
        })
}
