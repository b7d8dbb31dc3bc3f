//! Input validation for recipe trees.
//!
//! Checks value and structural integrity of a [`RecipeTree`] before it is
//! scheduled or balanced. Detects:
//! - Out-of-range values (negative duration or mass, non-positive `times`)
//! - Dangling step and ingredient references
//! - Steps with more than one parent, ingredients shared between steps
//! - Circular substep references (strict-tree validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3 (Depth-first search)

use std::collections::{HashMap, HashSet};

use crate::error::{RecipeError, RecipeResult, StructuralError};
use crate::models::{IngredientId, RecipeTree, StepId};

/// Validation result: every detected issue, not just the first.
pub type ValidationResult = Result<(), Vec<RecipeError>>;

/// Validates a recipe tree.
///
/// Checks:
/// 1. Recipe `times` is positive
/// 2. Step durations and ingredient masses are non-negative
/// 3. Top-level, substep and ingredient references resolve
/// 4. No step is listed twice on the top-level line
/// 5. Each step has at most one parent; each ingredient at most one owner
/// 6. No circular substep references
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_tree(tree: &RecipeTree) -> ValidationResult {
    let mut errors: Vec<RecipeError> = Vec::new();

    if let Err(e) = tree.recipe().validate() {
        errors.push(e.into());
    }
    for step in tree.steps() {
        if let Err(e) = step.validate() {
            errors.push(e.into());
        }
    }
    for ingredient in tree.all_ingredients() {
        if let Err(e) = ingredient.validate() {
            errors.push(e.into());
        }
    }

    // Top-level references
    let mut seen_top = HashSet::new();
    for &id in &tree.recipe().steps {
        if tree.step(id).is_err() {
            errors.push(StructuralError::DanglingTopLevel(id).into());
        }
        if !seen_top.insert(id) {
            errors.push(StructuralError::DuplicateTopLevel(id).into());
        }
    }

    // Substep and ingredient references, ownership
    let mut parent: HashMap<StepId, StepId> = HashMap::new();
    let mut owner: HashMap<IngredientId, StepId> = HashMap::new();
    for step in tree.steps() {
        for &child in &step.substeps {
            if tree.step(child).is_err() {
                errors.push(
                    StructuralError::DanglingSubstep {
                        parent: step.id,
                        child,
                    }
                    .into(),
                );
                continue;
            }
            if let Some(&first) = parent.get(&child) {
                errors.push(
                    StructuralError::MultipleParents {
                        step: child,
                        first,
                        second: step.id,
                    }
                    .into(),
                );
            } else {
                parent.insert(child, step.id);
            }
        }

        for &ingredient in &step.ingredients {
            if tree.ingredient(ingredient).is_err() {
                errors.push(
                    StructuralError::DanglingIngredient {
                        step: step.id,
                        ingredient,
                    }
                    .into(),
                );
                continue;
            }
            if let Some(&first) = owner.get(&ingredient) {
                errors.push(
                    StructuralError::SharedIngredient {
                        ingredient,
                        first,
                        second: step.id,
                    }
                    .into(),
                );
            } else {
                owner.insert(ingredient, step.id);
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(tree) {
        errors.push(cycle_err.into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a tree and returns the first issue found.
///
/// Convenience for `?` call sites that only need to refuse bad input.
pub fn ensure_valid(tree: &RecipeTree) -> RecipeResult<()> {
    match validate_tree(tree) {
        Ok(()) => Ok(()),
        Err(mut errors) => {
            tracing::debug!(
                recipe = %tree.recipe().name,
                issues = errors.len(),
                "recipe tree failed validation"
            );
            Err(errors.swap_remove(0))
        }
    }
}

/// Detects cycles in the substep graph using DFS.
///
/// # Algorithm
/// If a back-edge is found (visiting a node currently in the recursion
/// stack), a cycle exists. Dangling edges are skipped; they are reported
/// separately.
fn detect_cycles(tree: &RecipeTree) -> Option<StructuralError> {
    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for step in tree.steps() {
        if !visited.contains(&step.id) {
            if let Some(at) = find_cycle_dfs(step.id, tree, &mut visited, &mut in_stack) {
                return Some(StructuralError::Cycle(at));
            }
        }
    }

    None
}

fn find_cycle_dfs(
    node: StepId,
    tree: &RecipeTree,
    visited: &mut HashSet<StepId>,
    in_stack: &mut HashSet<StepId>,
) -> Option<StepId> {
    visited.insert(node);
    in_stack.insert(node);

    if let Ok(step) = tree.step(node) {
        for &next in &step.substeps {
            if in_stack.contains(&next) {
                return Some(next); // Back edge → cycle
            }
            if !visited.contains(&next) && tree.step(next).is_ok() {
                if let Some(at) = find_cycle_dfs(next, tree, visited, in_stack) {
                    return Some(at);
                }
            }
        }
    }

    in_stack.remove(&node);
    None
}
