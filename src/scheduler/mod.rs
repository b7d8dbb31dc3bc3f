//! Recipe scheduling.
//!
//! Turns a recipe tree into absolute, timestamped step timings.
//!
//! # Algorithm
//!
//! `ScheduleCalculator` lays the top-level steps out sequentially from the
//! recipe's anchor (forward from a start instant or backward from a finish
//! instant). `ReorderPolicy` times each step's substeps so they all become
//! ready exactly when the step's own work begins, initiating the longest
//! lead time first.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling", backward scheduling

mod calculator;
mod reorder;

pub use calculator::ScheduleCalculator;
pub use reorder::{LeadTime, ReorderPolicy, SubstepSlot, TieBreak};
