//! Recipe tree arena.
//!
//! Steps and ingredients live in flat maps keyed by stable ids; the
//! parent → children relation is stored as id lists on each step. Saving an
//! edit replaces one arena entry by id, so there are no nested copies to
//! keep in sync and identity stays unambiguous across edits.
//!
//! The arena does not enforce the strict-tree invariant on every edit;
//! [`crate::validation::validate_tree`] checks it before scheduling.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::{Ingredient, IngredientId, Recipe, Step, StepId};
use crate::error::{RecipeResult, StructuralError};

/// A recipe together with the steps and ingredients it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeTree {
    recipe: Recipe,
    steps: BTreeMap<StepId, Step>,
    ingredients: BTreeMap<IngredientId, Ingredient>,
    next_id: u64,
}

impl RecipeTree {
    /// Creates an empty tree for a recipe.
    ///
    /// Any step ids already listed by `recipe` are dropped; steps are added
    /// through [`RecipeTree::push_step`].
    pub fn new(mut recipe: Recipe) -> Self {
        recipe.steps.clear();
        Self {
            recipe,
            steps: BTreeMap::new(),
            ingredients: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// The recipe metadata.
    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Replaces the recipe metadata, keeping the current top-level step list.
    pub fn set_recipe(&mut self, mut recipe: Recipe) -> RecipeResult<()> {
        recipe.validate()?;
        recipe.steps = std::mem::take(&mut self.recipe.steps);
        self.recipe = recipe;
        Ok(())
    }

    // ======================== Queries ========================

    /// Looks up a step.
    pub fn step(&self, id: StepId) -> Result<&Step, StructuralError> {
        self.steps.get(&id).ok_or(StructuralError::UnknownStep(id))
    }

    /// Looks up an ingredient.
    pub fn ingredient(&self, id: IngredientId) -> Result<&Ingredient, StructuralError> {
        self.ingredients
            .get(&id)
            .ok_or(StructuralError::UnknownIngredient(id))
    }

    /// The sequentially executed line: steps listed by the recipe that are
    /// not any other step's substep, in recipe order.
    pub fn top_level_steps(&self) -> Result<Vec<&Step>, StructuralError> {
        let substeps: HashSet<StepId> = self
            .steps
            .values()
            .flat_map(|s| s.substeps.iter().copied())
            .collect();
        self.recipe
            .steps
            .iter()
            .filter(|&&id| !substeps.contains(&id))
            .map(|&id| {
                self.steps
                    .get(&id)
                    .ok_or(StructuralError::DanglingTopLevel(id))
            })
            .collect()
    }

    /// Ordered substeps of a step.
    pub fn children(&self, id: StepId) -> Result<Vec<&Step>, StructuralError> {
        let step = self.step(id)?;
        step.substeps
            .iter()
            .map(|&child| {
                self.steps
                    .get(&child)
                    .ok_or(StructuralError::DanglingSubstep { parent: id, child })
            })
            .collect()
    }

    /// Ordered ingredients of a step.
    pub fn ingredients(&self, id: StepId) -> Result<Vec<&Ingredient>, StructuralError> {
        let step = self.step(id)?;
        step.ingredients
            .iter()
            .map(|&ingredient| {
                self.ingredients
                    .get(&ingredient)
                    .ok_or(StructuralError::DanglingIngredient { step: id, ingredient })
            })
            .collect()
    }

    /// The step listing `id` as a substep, if any.
    pub fn parent_of(&self, id: StepId) -> Option<StepId> {
        self.steps
            .values()
            .find(|s| s.substeps.contains(&id))
            .map(|s| s.id)
    }

    /// All steps, ordered by id.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    /// All ingredients, ordered by id.
    pub fn all_ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.values()
    }

    /// Number of steps in the arena.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Number of ingredients in the arena.
    pub fn ingredient_count(&self) -> usize {
        self.ingredients.len()
    }

    // ======================== Arena edits ========================

    /// Inserts a detached step and returns its new id.
    pub fn add_step(&mut self, mut step: Step) -> StepId {
        let id = StepId(self.allocate());
        step.id = id;
        self.steps.insert(id, step);
        id
    }

    /// Inserts a detached ingredient and returns its new id.
    pub fn add_ingredient(&mut self, mut ingredient: Ingredient) -> IngredientId {
        let id = IngredientId(self.allocate());
        ingredient.id = id;
        self.ingredients.insert(id, ingredient);
        id
    }

    /// Appends an existing step to the recipe's top-level line.
    pub fn push_top_level(&mut self, id: StepId) -> Result<(), StructuralError> {
        self.step(id)?;
        self.recipe.steps.push(id);
        Ok(())
    }

    /// Appends an existing step as the last substep of `parent`.
    pub fn attach_substep(&mut self, parent: StepId, child: StepId) -> Result<(), StructuralError> {
        self.step(child)?;
        self.step_mut(parent)?.substeps.push(child);
        Ok(())
    }

    /// Appends an existing ingredient to `step`.
    pub fn attach_ingredient(
        &mut self,
        step: StepId,
        ingredient: IngredientId,
    ) -> Result<(), StructuralError> {
        self.ingredient(ingredient)?;
        self.step_mut(step)?.ingredients.push(ingredient);
        Ok(())
    }

    /// Inserts a step and appends it to the top-level line.
    pub fn push_step(&mut self, step: Step) -> StepId {
        let id = self.add_step(step);
        self.recipe.steps.push(id);
        id
    }

    /// Inserts a step as the last substep of `parent`.
    pub fn push_substep(&mut self, parent: StepId, step: Step) -> Result<StepId, StructuralError> {
        self.step(parent)?;
        let id = self.add_step(step);
        self.attach_substep(parent, id)?;
        Ok(id)
    }

    /// Inserts an ingredient into `step`.
    pub fn push_ingredient(
        &mut self,
        step: StepId,
        ingredient: Ingredient,
    ) -> Result<IngredientId, StructuralError> {
        self.step(step)?;
        let id = self.add_ingredient(ingredient);
        self.attach_ingredient(step, id)?;
        Ok(id)
    }

    /// Saves an edited step in place of the entry with the same id.
    pub fn replace_step(&mut self, step: Step) -> RecipeResult<()> {
        step.validate()?;
        let slot = self
            .steps
            .get_mut(&step.id)
            .ok_or(StructuralError::UnknownStep(step.id))?;
        *slot = step;
        Ok(())
    }

    /// Saves an edited ingredient in place of the entry with the same id.
    pub fn replace_ingredient(&mut self, ingredient: Ingredient) -> RecipeResult<()> {
        ingredient.validate()?;
        let slot = self
            .ingredients
            .get_mut(&ingredient.id)
            .ok_or(StructuralError::UnknownIngredient(ingredient.id))?;
        *slot = ingredient;
        Ok(())
    }

    /// Removes a step, its whole subtree, and every ingredient they own.
    ///
    /// Links to the removed step from its parent and from the top-level
    /// line are dropped too. Returns the removed root step.
    pub fn remove_step(&mut self, id: StepId) -> Result<Step, StructuralError> {
        self.step(id)?;
        for step in self.steps.values_mut() {
            step.substeps.retain(|&s| s != id);
        }
        self.recipe.steps.retain(|&s| s != id);

        let mut pending = vec![id];
        let mut root = None;
        while let Some(next) = pending.pop() {
            let Some(step) = self.steps.remove(&next) else {
                continue;
            };
            for ingredient in &step.ingredients {
                self.ingredients.remove(ingredient);
            }
            pending.extend(step.substeps.iter().copied());
            if next == id {
                root = Some(step);
            }
        }
        root.ok_or(StructuralError::UnknownStep(id))
    }

    fn step_mut(&mut self, id: StepId) -> Result<&mut Step, StructuralError> {
        self.steps
            .get_mut(&id)
            .ok_or(StructuralError::UnknownStep(id))
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
