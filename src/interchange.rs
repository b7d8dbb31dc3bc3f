//! Recipe interchange format (JSON).
//!
//! Nested documents mirror the recipe tree:
//!
//! ```text
//! Recipe     { name, info, difficulty, times, imageData?, steps: [Step],
//!              isFavourite, running, date, inverted }
//! Step       { name, duration (s), temperature, notes, isDynamicTemperature,
//!              startTemp?, endTemp?, substeps: [Step], ingredients: [Ingredient] }
//! Ingredient { name, mass, temperature?, style }
//! ```
//!
//! Export neutralizes session-only fields (favourite, running, anchor
//! date, inverted) so exported files are reproducible. Import re-validates
//! every value and allocates fresh arena ids.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecipeResult, ValidationError};
use crate::models::{Difficulty, Ingredient, IngredientStyle, Recipe, RecipeTree, Step, StepId};
use crate::validation::ensure_valid;

/// Serialized recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDocument {
    pub name: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub times: f64,
    /// Base64-encoded image bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepDocument>,
    #[serde(default)]
    pub is_favourite: bool,
    #[serde(default)]
    pub running: bool,
    #[serde(default = "epoch")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub inverted: bool,
}

/// Serialized step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDocument {
    pub name: String,
    /// Seconds.
    pub duration: f64,
    pub temperature: i32,
    #[serde(default)]
    pub notes: String,
    /// When true, `start_temp` and `end_temp` must both be present; when
    /// false they are ignored on import.
    #[serde(default)]
    pub is_dynamic_temperature: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_temp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_temp: Option<i32>,
    #[serde(default)]
    pub substeps: Vec<StepDocument>,
    #[serde(default)]
    pub ingredients: Vec<IngredientDocument>,
}

/// Serialized ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientDocument {
    pub name: String,
    pub mass: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(default)]
    pub style: IngredientStyle,
}

/// A file holds either one recipe or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<RecipeDocument>),
    One(Box<RecipeDocument>),
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl RecipeDocument {
    /// Builds the export document for a tree.
    pub fn from_tree(tree: &RecipeTree) -> RecipeResult<Self> {
        ensure_valid(tree)?;
        let recipe = tree.recipe();
        let steps = tree
            .top_level_steps()?
            .iter()
            .map(|s| StepDocument::from_tree(tree, s.id))
            .collect::<RecipeResult<Vec<_>>>()?;

        Ok(Self {
            name: recipe.name.clone(),
            info: recipe.info.clone(),
            difficulty: recipe.difficulty,
            times: recipe.times,
            image_data: recipe.image_data.as_ref().map(|bytes| STANDARD.encode(bytes)),
            steps,
            is_favourite: false,
            running: false,
            date: epoch(),
            inverted: false,
        })
    }

    /// Builds a validated tree from the document.
    pub fn into_tree(self) -> RecipeResult<RecipeTree> {
        let mut recipe = Recipe::new(self.name)
            .with_info(self.info)
            .with_difficulty(self.difficulty)
            .with_times(self.times)?;
        recipe = if self.inverted {
            recipe.finishing_at(self.date)
        } else {
            recipe.starting_at(self.date)
        };
        recipe.is_favourite = self.is_favourite;
        recipe.running = self.running;
        if let Some(encoded) = self.image_data {
            recipe = recipe.with_image_data(STANDARD.decode(encoded)?);
        }

        let mut tree = RecipeTree::new(recipe);
        for step in self.steps {
            step.insert_into(&mut tree, None)?;
        }
        ensure_valid(&tree)?;
        Ok(tree)
    }
}

impl StepDocument {
    fn from_tree(tree: &RecipeTree, id: StepId) -> RecipeResult<Self> {
        let step = tree.step(id)?;
        let substeps = step
            .substeps
            .iter()
            .map(|&child| Self::from_tree(tree, child))
            .collect::<RecipeResult<Vec<_>>>()?;
        let ingredients = tree
            .ingredients(id)?
            .into_iter()
            .map(IngredientDocument::from)
            .collect();

        Ok(Self {
            name: step.name.clone(),
            duration: step.duration_ms as f64 / 1000.0,
            temperature: step.temperature,
            notes: step.notes.clone(),
            is_dynamic_temperature: step.is_dynamic_temperature(),
            start_temp: step.start_temp,
            end_temp: step.end_temp,
            substeps,
            ingredients,
        })
    }

    fn insert_into(self, tree: &mut RecipeTree, parent: Option<StepId>) -> RecipeResult<StepId> {
        let mut step = Step::seconds(self.name, self.duration)?
            .with_temperature(self.temperature)
            .with_notes(self.notes);
        if self.is_dynamic_temperature {
            match (self.start_temp, self.end_temp) {
                (Some(start), Some(end)) => step = step.with_dynamic_temperature(start, end),
                _ => {
                    let step = step.name;
                    return Err(ValidationError::IncompleteTemperatureRamp { step }.into());
                }
            }
        }

        let id = match parent {
            Some(parent) => tree.push_substep(parent, step)?,
            None => tree.push_step(step),
        };
        for ingredient in self.ingredients {
            let mut built =
                Ingredient::new(ingredient.name, ingredient.mass)?.with_style(ingredient.style);
            built.temperature = ingredient.temperature;
            tree.push_ingredient(id, built)?;
        }
        for substep in self.substeps {
            substep.insert_into(tree, Some(id))?;
        }
        Ok(id)
    }
}

impl From<&Ingredient> for IngredientDocument {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            name: ingredient.name.clone(),
            mass: ingredient.mass,
            temperature: ingredient.temperature,
            style: ingredient.style,
        }
    }
}

/// Exports one recipe as pretty-printed JSON.
pub fn export_recipe(tree: &RecipeTree) -> RecipeResult<String> {
    Ok(serde_json::to_string_pretty(&RecipeDocument::from_tree(tree)?)?)
}

/// Exports several recipes as a pretty-printed JSON array.
pub fn export_recipes(trees: &[RecipeTree]) -> RecipeResult<String> {
    let documents = trees
        .iter()
        .map(RecipeDocument::from_tree)
        .collect::<RecipeResult<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&documents)?)
}

/// Imports a single recipe document.
pub fn import_recipe(json: &str) -> RecipeResult<RecipeTree> {
    let document: RecipeDocument = serde_json::from_str(json)?;
    document.into_tree()
}

/// Imports a recipe file holding one recipe or an array of recipes.
pub fn import_recipes(json: &str) -> RecipeResult<Vec<RecipeTree>> {
    let documents = match serde_json::from_str::<Payload>(json)? {
        Payload::Many(documents) => documents,
        Payload::One(document) => vec![*document],
    };
    tracing::debug!(count = documents.len(), "importing recipes");
    documents
        .into_iter()
        .map(RecipeDocument::into_tree)
        .collect()
}
