//! Absolute timestamps for a whole recipe.
//!
//! # Algorithm
//!
//! 1. Validate the tree (values and strict-tree structure).
//! 2. Compute `lead_time(step) = duration + max(0, max lead_time(child))`
//!    bottom-up, memoized by step id.
//! 3. Lay out the top-level line sequentially from the anchor:
//!    - forward (`inverted == false`): `start(top₁) = A`,
//!      `start(topₖ₊₁) = end(topₖ)`;
//!    - backward (`inverted == true`): `end(last) = A`,
//!      `end(topₖ) = start(topₖ₊₁)`.
//! 4. For every step, time its substeps with [`ReorderPolicy`] using the
//!    step's own start as their shared deadline, recursively.
//!
//! Only own durations advance the top-level line; a step's substeps run
//! before its start and may overlap earlier top-level steps.
//!
//! All time arithmetic is checked: durations whose sums or instants leave
//! `i64` milliseconds or chrono's calendar yield
//! [`ValidationError::OutOfRange`] instead of panicking.
//!
//! # Complexity
//! O(n log n) in the number of steps (sibling sorting dominates).

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::reorder::{offset_ms, LeadTime, ReorderPolicy};
use crate::config::ScheduleConfig;
use crate::error::{RecipeResult, StructuralError, ValidationError};
use crate::models::{RecipeSchedule, RecipeTree, StepId, StepTiming};
use crate::validation::ensure_valid;

/// Computes lead times and absolute step timestamps.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use u_bake::models::{Recipe, RecipeTree, Step};
/// use u_bake::scheduler::ScheduleCalculator;
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
/// let mut tree = RecipeTree::new(Recipe::new("Loaf").starting_at(t));
/// let a = tree.push_step(Step::minutes("A", 10).unwrap());
/// let b = tree.push_step(Step::minutes("B", 20).unwrap());
///
/// let schedule = ScheduleCalculator::new().schedule(&tree).unwrap();
/// assert_eq!(schedule.timing_for_step(a).unwrap().start, t);
/// assert_eq!(schedule.timing_for_step(b).unwrap().start, t + chrono::TimeDelta::minutes(10));
/// assert_eq!(schedule.finish, t + chrono::TimeDelta::minutes(30));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleCalculator {
    policy: ReorderPolicy,
}

impl ScheduleCalculator {
    /// Creates a calculator with the default reorder policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given reorder policy for substeps.
    pub fn with_policy(mut self, policy: ReorderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a calculator from configuration.
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new().with_policy(ReorderPolicy::new().with_tie_break(config.tie_break))
    }

    /// Lead time of a single step (ms).
    pub fn lead_time(&self, tree: &RecipeTree, step_id: StepId) -> RecipeResult<i64> {
        ensure_valid(tree)?;
        tree.step(step_id)?;
        let mut memo = HashMap::new();
        lead_time_of(tree, step_id, &mut memo)
    }

    /// Lead time of every step in the tree (ms).
    pub fn lead_times(&self, tree: &RecipeTree) -> RecipeResult<HashMap<StepId, i64>> {
        ensure_valid(tree)?;
        all_lead_times(tree)
    }

    /// Elapsed time from the earliest initiation anywhere in the tree to
    /// the end of the top-level line (ms).
    ///
    /// `max over k of (Σ_{j≥k} duration(topⱼ) + leadTime(topₖ) − duration(topₖ))`
    pub fn sequence_lead_time(&self, tree: &RecipeTree) -> RecipeResult<i64> {
        ensure_valid(tree)?;
        let memo = all_lead_times(tree)?;
        let top = tree.top_level_steps()?;

        let mut remaining: i64 = 0;
        let mut span: i64 = 0;
        for step in top.iter().rev() {
            remaining = checked_sum(remaining, step.duration_ms)?;
            let lead = lead_for(&memo, step.id)?;
            span = span.max(checked_sum(remaining, lead - step.duration_ms)?);
        }
        Ok(span)
    }

    /// Schedules the tree from the recipe's own anchor.
    pub fn schedule(&self, tree: &RecipeTree) -> RecipeResult<RecipeSchedule> {
        let recipe = tree.recipe();
        self.schedule_at(tree, recipe.date, recipe.inverted)
    }

    /// Schedules the tree from an explicit anchor.
    ///
    /// `inverted == false`: `anchor` is the start of the first top-level
    /// step. `inverted == true`: `anchor` is the recipe finish.
    pub fn schedule_at(
        &self,
        tree: &RecipeTree,
        anchor: DateTime<Utc>,
        inverted: bool,
    ) -> RecipeResult<RecipeSchedule> {
        ensure_valid(tree)?;
        let memo = all_lead_times(tree)?;
        let top = tree.top_level_steps()?;

        let line_ms = top
            .iter()
            .try_fold(0i64, |total, s| checked_sum(total, s.duration_ms))?;
        let first_start = if inverted {
            offset_ms(anchor, -line_ms)?
        } else {
            anchor
        };

        let mut schedule = RecipeSchedule::empty(anchor, inverted);
        schedule.first_start = first_start;

        let mut cursor = first_start;
        for (sequence, step) in top.iter().enumerate() {
            let start = cursor;
            let end = offset_ms(start, step.duration_ms)?;
            let lead_time_ms = lead_for(&memo, step.id)?;
            schedule.add_timing(StepTiming {
                step_id: step.id,
                parent_id: None,
                start,
                end,
                initiate_at: offset_ms(end, -lead_time_ms)?,
                lead_time_ms,
                sequence,
            });
            self.schedule_substeps(tree, &memo, step.id, start, &mut schedule)?;
            cursor = end;
        }
        schedule.finish = cursor;

        tracing::debug!(
            recipe = %tree.recipe().name,
            steps = schedule.step_count(),
            first_start = %schedule.first_start,
            finish = %schedule.finish,
            inverted,
            "scheduled recipe"
        );
        Ok(schedule)
    }

    /// Times the substeps of `parent`, which must all be ready at `deadline`.
    fn schedule_substeps(
        &self,
        tree: &RecipeTree,
        memo: &HashMap<StepId, i64>,
        parent: StepId,
        deadline: DateTime<Utc>,
        schedule: &mut RecipeSchedule,
    ) -> RecipeResult<()> {
        let children = tree.children(parent)?;
        if children.is_empty() {
            return Ok(());
        }

        let lead_times = children
            .iter()
            .map(|c| {
                Ok(LeadTime {
                    step_id: c.id,
                    lead_time_ms: lead_for(memo, c.id)?,
                })
            })
            .collect::<Result<Vec<_>, StructuralError>>()?;

        for slot in self.policy.plan(&lead_times, deadline)? {
            let step = tree.step(slot.step_id)?;
            let start = offset_ms(deadline, -step.duration_ms)?;
            tracing::trace!(
                step = %step.name,
                parent = %parent,
                sequence = slot.sequence,
                initiate_at = %slot.initiate_at,
                "timed substep"
            );
            schedule.add_timing(StepTiming {
                step_id: step.id,
                parent_id: Some(parent),
                start,
                end: deadline,
                initiate_at: slot.initiate_at,
                lead_time_ms: slot.lead_time_ms,
                sequence: slot.sequence,
            });
            self.schedule_substeps(tree, memo, step.id, start, schedule)?;
        }
        Ok(())
    }
}

fn lead_for(memo: &HashMap<StepId, i64>, id: StepId) -> Result<i64, StructuralError> {
    memo.get(&id)
        .copied()
        .ok_or(StructuralError::UnknownStep(id))
}

/// `a + b` for millisecond spans, or `OutOfRange` on `i64` overflow.
fn checked_sum(a: i64, b: i64) -> Result<i64, ValidationError> {
    a.checked_add(b).ok_or(ValidationError::OutOfRange {
        field: "duration",
        value: a.saturating_add(b),
    })
}

fn all_lead_times(tree: &RecipeTree) -> RecipeResult<HashMap<StepId, i64>> {
    let mut memo = HashMap::with_capacity(tree.step_count());
    for step in tree.steps() {
        lead_time_of(tree, step.id, &mut memo)?;
    }
    Ok(memo)
}

/// Lead time of `id`, memoized. The tree must be acyclic.
fn lead_time_of(
    tree: &RecipeTree,
    id: StepId,
    memo: &mut HashMap<StepId, i64>,
) -> RecipeResult<i64> {
    if let Some(&cached) = memo.get(&id) {
        return Ok(cached);
    }
    let step = tree.step(id)?;
    let mut longest_child: i64 = 0;
    for &child in &step.substeps {
        longest_child = longest_child.max(lead_time_of(tree, child, memo)?);
    }
    let lead = checked_sum(step.duration_ms, longest_child)?;
    memo.insert(id, lead);
    Ok(lead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recipe, Step};
    use crate::scheduler::TieBreak;
    use crate::error::RecipeError;
    use chrono::{TimeDelta, TimeZone};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap()
    }

    fn minutes(m: i64) -> TimeDelta {
        TimeDelta::minutes(m)
    }

    /// Bulk (60m) with two substeps: Levain (240m, which has its own
    /// Refresh substep of 60m) and Soaker (120m); then Bake (45m).
    fn nested_tree(inverted: bool) -> (RecipeTree, [StepId; 5]) {
        let recipe = if inverted {
            Recipe::new("Rye").finishing_at(t0())
        } else {
            Recipe::new("Rye").starting_at(t0())
        };
        let mut tree = RecipeTree::new(recipe);
        let bulk = tree.push_step(Step::minutes("Bulk", 60).unwrap());
        let levain = tree
            .push_substep(bulk, Step::minutes("Levain", 240).unwrap())
            .unwrap();
        let refresh = tree
            .push_substep(levain, Step::minutes("Refresh", 60).unwrap())
            .unwrap();
        let soaker = tree
            .push_substep(bulk, Step::minutes("Soaker", 120).unwrap())
            .unwrap();
        let bake = tree.push_step(Step::minutes("Bake", 45).unwrap());
        (tree, [bulk, levain, refresh, soaker, bake])
    }

    #[test]
    fn test_sequential_forward() {
        let mut tree = RecipeTree::new(Recipe::new("Simple").starting_at(t0()));
        let a = tree.push_step(Step::minutes("A", 10).unwrap());
        let b = tree.push_step(Step::minutes("B", 20).unwrap());

        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        let ta = s.timing_for_step(a).unwrap();
        let tb = s.timing_for_step(b).unwrap();
        assert_eq!(ta.start, t0());
        assert_eq!(ta.end, t0() + minutes(10));
        assert_eq!(tb.start, ta.end);
        assert_eq!(tb.end, t0() + minutes(30));
        assert_eq!(s.finish, t0() + minutes(30));
        assert_eq!(s.first_start, t0());
    }

    #[test]
    fn test_sequential_inverted() {
        let mut tree = RecipeTree::new(Recipe::new("Simple").finishing_at(t0()));
        let a = tree.push_step(Step::minutes("A", 10).unwrap());
        let b = tree.push_step(Step::minutes("B", 20).unwrap());

        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        let ta = s.timing_for_step(a).unwrap();
        let tb = s.timing_for_step(b).unwrap();
        assert_eq!(tb.end, t0());
        assert_eq!(ta.end, tb.start);
        assert_eq!(ta.start, t0() - minutes(30));
        assert_eq!(s.finish, t0());
    }

    #[test]
    fn test_lead_times() {
        let (tree, [bulk, levain, refresh, soaker, bake]) = nested_tree(false);
        let calc = ScheduleCalculator::new();
        let lt = calc.lead_times(&tree).unwrap();
        assert_eq!(lt[&refresh], 60 * 60_000);
        assert_eq!(lt[&levain], 300 * 60_000);
        assert_eq!(lt[&soaker], 120 * 60_000);
        assert_eq!(lt[&bulk], 360 * 60_000);
        assert_eq!(lt[&bake], 45 * 60_000);
        assert_eq!(calc.lead_time(&tree, bulk).unwrap(), 360 * 60_000);
    }

    #[test]
    fn test_substeps_ready_at_parent_start() {
        let (tree, [bulk, levain, refresh, soaker, _]) = nested_tree(false);
        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        let bulk_t = s.timing_for_step(bulk).unwrap();
        let levain_t = s.timing_for_step(levain).unwrap();
        let soaker_t = s.timing_for_step(soaker).unwrap();
        let refresh_t = s.timing_for_step(refresh).unwrap();

        // Both substeps finish exactly when Bulk starts.
        assert_eq!(levain_t.end, bulk_t.start);
        assert_eq!(soaker_t.end, bulk_t.start);
        // Levain has the longer lead time and is initiated first.
        assert_eq!(levain_t.sequence, 0);
        assert_eq!(soaker_t.sequence, 1);
        assert_eq!(levain_t.initiate_at, t0() - minutes(300));
        assert_eq!(soaker_t.initiate_at, t0() - minutes(120));
        // Levain's own work starts after its subtree is initiated.
        assert_eq!(levain_t.start, t0() - minutes(240));
        assert!(levain_t.initiate_at < levain_t.start);
        assert_eq!(soaker_t.start, soaker_t.initiate_at);
        // Refresh is ready when Levain's own work begins.
        assert_eq!(refresh_t.end, levain_t.start);
        assert_eq!(refresh_t.start, t0() - minutes(300));
        assert_eq!(s.earliest_start(), t0() - minutes(300));
    }

    #[test]
    fn test_parent_child_lead_time_consistency() {
        let (tree, _) = nested_tree(true);
        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        for t in &s.timings {
            assert_eq!(t.end - t.start, TimeDelta::milliseconds(t.duration_ms()));
            if let Some(parent) = t.parent_id {
                let p = s.timing_for_step(parent).unwrap();
                assert_eq!((p.start - t.initiate_at).num_milliseconds(), t.lead_time_ms);
            }
        }
    }

    #[test]
    fn test_inverted_with_substeps() {
        let (tree, [bulk, levain, _, _, bake]) = nested_tree(true);
        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        assert_eq!(s.timing_for_step(bake).unwrap().end, t0());
        assert_eq!(s.timing_for_step(bulk).unwrap().start, t0() - minutes(105));
        assert_eq!(
            s.timing_for_step(levain).unwrap().initiate_at,
            t0() - minutes(105 + 300)
        );
    }

    #[test]
    fn test_sequence_lead_time_matches_span() {
        let (tree, _) = nested_tree(false);
        let calc = ScheduleCalculator::new();
        let s = calc.schedule(&tree).unwrap();
        let expected = calc.sequence_lead_time(&tree).unwrap();
        assert_eq!(expected, (360 + 45) * 60_000);
        assert_eq!(s.total_span().num_milliseconds(), expected);
    }

    #[test]
    fn test_every_step_timed_once() {
        let (tree, ids) = nested_tree(false);
        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        assert_eq!(s.step_count(), tree.step_count());
        for id in ids {
            assert_eq!(s.timings.iter().filter(|t| t.step_id == id).count(), 1);
        }
    }

    #[test]
    fn test_zero_duration_marker() {
        let mut tree = RecipeTree::new(Recipe::new("Marker").starting_at(t0()));
        let mark = tree.push_step(Step::new("Preheat oven", 0).unwrap());
        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        let t = s.timing_for_step(mark).unwrap();
        assert_eq!(t.start, t.end);
        assert_eq!(s.finish, t0());
    }

    #[test]
    fn test_empty_recipe() {
        let tree = RecipeTree::new(Recipe::new("Empty").starting_at(t0()));
        let s = ScheduleCalculator::new().schedule(&tree).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.finish, t0());
    }

    #[test]
    fn test_schedule_at_overrides_anchor() {
        let (tree, [_, _, _, _, bake]) = nested_tree(false);
        let anchor = t0() + minutes(600);
        let s = ScheduleCalculator::new()
            .schedule_at(&tree, anchor, true)
            .unwrap();
        assert_eq!(s.timing_for_step(bake).unwrap().end, anchor);
        assert!(s.inverted);
    }

    #[test]
    fn test_tie_break_from_config() {
        let mut tree = RecipeTree::new(Recipe::new("Ties").starting_at(t0()));
        let main = tree.push_step(Step::minutes("Main", 10).unwrap());
        let first = tree
            .push_substep(main, Step::minutes("First", 30).unwrap())
            .unwrap();
        let second = tree
            .push_substep(main, Step::minutes("Second", 30).unwrap())
            .unwrap();

        let config = ScheduleConfig::new().with_tie_break(TieBreak::AuthoringOrder);
        let s = ScheduleCalculator::from_config(&config).schedule(&tree).unwrap();
        assert_eq!(s.timing_for_step(first).unwrap().sequence, 0);
        assert_eq!(s.timing_for_step(second).unwrap().sequence, 1);
    }

    #[test]
    fn test_rejects_cyclic_tree() {
        let (mut tree, [bulk, levain, ..]) = nested_tree(false);
        tree.attach_substep(levain, bulk).unwrap();
        let err = ScheduleCalculator::new().schedule(&tree).unwrap_err();
        assert!(err.is_structural());
    }

    fn is_out_of_range<T>(result: RecipeResult<T>) -> bool {
        matches!(
            result,
            Err(RecipeError::Validation(ValidationError::OutOfRange {
                field: "duration",
                ..
            }))
        )
    }

    #[test]
    fn test_durations_beyond_calendar_are_rejected() {
        // About 317,000 years, past chrono's representable range.
        let huge_ms = 10_000_000_000_000_000;
        for inverted in [false, true] {
            let recipe = if inverted {
                Recipe::new("Huge").finishing_at(t0())
            } else {
                Recipe::new("Huge").starting_at(t0())
            };
            let mut tree = RecipeTree::new(recipe);
            tree.push_step(Step::new("Rest", huge_ms).unwrap());
            assert!(is_out_of_range(ScheduleCalculator::new().schedule(&tree)));
        }

        let mut tree = RecipeTree::new(Recipe::new("Huge").starting_at(t0()));
        let bulk = tree.push_step(Step::minutes("Bulk", 10).unwrap());
        tree.push_substep(bulk, Step::new("Levain", huge_ms).unwrap())
            .unwrap();
        assert!(is_out_of_range(ScheduleCalculator::new().schedule(&tree)));
    }

    #[test]
    fn test_duration_sum_overflow_is_rejected() {
        let mut tree = RecipeTree::new(Recipe::new("Huge").finishing_at(t0()));
        tree.push_step(Step::new("A", i64::MAX / 2 + 1).unwrap());
        tree.push_step(Step::new("B", i64::MAX / 2 + 1).unwrap());
        let calc = ScheduleCalculator::new();
        assert!(is_out_of_range(calc.schedule(&tree)));
        assert!(is_out_of_range(calc.sequence_lead_time(&tree)));

        let mut tree = RecipeTree::new(Recipe::new("Deep").starting_at(t0()));
        let outer = tree.push_step(Step::new("Outer", i64::MAX).unwrap());
        tree.push_substep(outer, Step::new("Inner", 1).unwrap())
            .unwrap();
        assert!(is_out_of_range(calc.lead_time(&tree, outer)));
        assert!(is_out_of_range(calc.schedule(&tree)));
    }

    #[test]
    fn test_random_trees_are_consistent() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut tree = RecipeTree::new(Recipe::new("Random").finishing_at(t0()));
            let mut ids = Vec::new();
            for i in 0..rng.random_range(1..5) {
                ids.push(tree.push_step(
                    Step::minutes(format!("T{i}"), rng.random_range(0..120)).unwrap(),
                ));
            }
            for i in 0..rng.random_range(0..10) {
                let parent = ids[rng.random_range(0..ids.len())];
                let child = tree
                    .push_substep(
                        parent,
                        Step::minutes(format!("S{i}"), rng.random_range(0..600)).unwrap(),
                    )
                    .unwrap();
                ids.push(child);
            }

            let calc = ScheduleCalculator::new();
            let s = calc.schedule(&tree).unwrap();
            let lead = calc.lead_times(&tree).unwrap();
            assert_eq!(s.step_count(), tree.step_count());
            assert_eq!(s.finish, t0());
            for t in &s.timings {
                let step = tree.step(t.step_id).unwrap();
                let children_idle = tree
                    .children(step.id)
                    .unwrap()
                    .iter()
                    .all(|c| lead[&c.id] == 0);
                assert!(lead[&t.step_id] >= step.duration_ms);
                assert_eq!(lead[&t.step_id] == step.duration_ms, children_idle);
                assert_eq!((t.end - t.start).num_milliseconds(), step.duration_ms);
                if let Some(parent) = t.parent_id {
                    let p = s.timing_for_step(parent).unwrap();
                    assert_eq!(t.end, p.start);
                    assert_eq!((p.start - t.initiate_at).num_milliseconds(), lead[&t.step_id]);
                }
            }
            assert_eq!(
                s.total_span().num_milliseconds(),
                calc.sequence_lead_time(&tree).unwrap()
            );
        }
    }
}
