//! In-memory recipe store.
//!
//! Not durable; state is lost when the process exits. Recipes are kept in
//! insertion order behind a `tokio` read-write lock.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{page_window, RecipeFilter, RecipeStore};
use crate::db::models::Recipe;
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct MemoryRecipeStore {
    recipes: RwLock<Vec<Recipe>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.recipes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.recipes.read().await.is_empty()
    }
}

fn insert(recipes: &mut Vec<Recipe>, recipe: &Recipe) -> Result<()> {
    if recipes.iter().any(|r| r.id == recipe.id) {
        return Err(Error::storage(
            format!("create recipe {}", recipe.id),
            "duplicate recipe id",
        ));
    }
    if let Some(key) = &recipe.query_key {
        if recipes.iter().any(|r| r.query_key.as_ref() == Some(key)) {
            return Err(Error::storage(
                format!("create recipe {}", recipe.id),
                "duplicate query key",
            ));
        }
    }
    recipes.push(recipe.clone());
    Ok(())
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn get_by_id(&self, id: &str) -> Result<Recipe> {
        self.recipes
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Recipe {id} not found")))
    }

    async fn list_all(&self) -> Result<Vec<Recipe>> {
        Ok(self.recipes.read().await.clone())
    }

    async fn list_filtered(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        page_window(offset, limit)?;

        let recipes = self.recipes.read().await;
        let matching: Vec<&Recipe> = recipes.iter().filter(|r| filter.matches(r)).collect();
        let total = matching.len() as u64;

        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn create(&self, recipe: &Recipe) -> Result<()> {
        insert(&mut *self.recipes.write().await, recipe)
    }

    async fn create_if_absent(&self, recipe: &Recipe) -> Result<(Recipe, bool)> {
        let mut recipes = self.recipes.write().await;

        if let Some(key) = &recipe.query_key {
            if let Some(existing) = recipes
                .iter()
                .find(|r| r.query_key.as_deref() == Some(key.as_str()))
            {
                return Ok((existing.clone(), false));
            }
        }

        insert(&mut recipes, recipe)?;
        Ok((recipe.clone(), true))
    }
}
