use std::sync::Arc;

use serde::Serialize;

use super::errors::OrderError;
use super::value_objects::{IngredientId, PancakeId};
use crate::utils::{RetryConfig, SnapshotList};

// ============================================================================
// Pancakes and Ingredients
// ============================================================================

pub const MAX_INGREDIENT_NAME_LEN: usize = 50;

/// Immutable topping; two ingredients are the same only if their ids match
#[derive(Debug, Clone, Serialize)]
pub struct Ingredient {
    id: IngredientId,
    name: String,
}

impl Ingredient {
    pub fn new(name: &str) -> Result<Self, OrderError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(OrderError::validation("name", "Ingredient cannot be empty"));
        }
        if name.chars().count() > MAX_INGREDIENT_NAME_LEN {
            return Err(OrderError::validation(
                "name",
                format!("Ingredient name too long (max {} characters)", MAX_INGREDIENT_NAME_LEN),
            ));
        }

        Ok(Self {
            id: IngredientId::new(),
            name: name.to_string(),
        })
    }

    pub fn id(&self) -> IngredientId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Ingredient {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Ingredient {}

#[derive(Debug, Default)]
pub struct Pancake {
    id: PancakeId,
    ingredients: SnapshotList<Ingredient>,
}

impl Pancake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> PancakeId {
        self.id
    }

    /// Ingredients in the order they were added
    pub fn ingredients(&self) -> Arc<Vec<Ingredient>> {
        self.ingredients.load()
    }

    pub fn ingredient(&self, ingredient_id: IngredientId) -> Option<Ingredient> {
        self.ingredients.find(|i| i.id == ingredient_id)
    }

    /// Append an ingredient, returning the new ingredient count
    pub async fn add_ingredient(
        &self,
        ingredient: Ingredient,
        retry: &RetryConfig,
    ) -> Result<usize, OrderError> {
        Ok(self.ingredients.push(ingredient, retry, "add_ingredient").await?)
    }

    /// Remove an ingredient; `Ok(false)` if it was not on this pancake
    pub async fn remove_ingredient(
        &self,
        ingredient_id: IngredientId,
        retry: &RetryConfig,
    ) -> Result<bool, OrderError> {
        Ok(self
            .ingredients
            .remove_where(|i| i.id == ingredient_id, retry, "remove_ingredient")
            .await?)
    }

    pub fn description(&self) -> String {
        let ingredients = self.ingredients();
        if ingredients.is_empty() {
            return "Delicious plain pancake!".to_string();
        }

        let names: Vec<&str> = ingredients.iter().map(Ingredient::name).collect();
        format!("Delicious pancake with {}!", names.join(", "))
    }
}
