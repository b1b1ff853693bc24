//! Persistence abstraction for recipes.
//!
//! [`RecipeStore`] is the single shared mutable resource behind the resolver
//! and the filter engine. Two implementations are provided:
//!
//! - [`SqliteRecipeStore`]: the production store, backed by an `sqlx` pool
//! - [`MemoryRecipeStore`]: a process-local store for tests and dev runs
//!
//! Both enumerate recipes in insertion order and match text against the
//! Unicode-lowercased title and individual list elements, so results agree
//! between them.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::db::models::{any_contains_folded, contains_folded, Recipe, RecipeQueryRequest};
use crate::error::{Error, Result};

pub use memory::MemoryRecipeStore;
pub use sqlite::SqliteRecipeStore;

/// Conjunctive listing predicates; `None` means the predicate is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Exact owner match
    pub user_id: Option<String>,
    /// Title contains this text
    pub title_contains: Option<String>,
    /// Title or ingredients contain this text
    pub text: Option<String>,
}

impl RecipeFilter {
    pub fn from_request(request: &RecipeQueryRequest) -> Self {
        fn active(value: Option<&str>) -> Option<String> {
            value.filter(|v| !v.is_empty()).map(str::to_string)
        }

        Self {
            user_id: active(request.user_id.as_deref()),
            title_contains: active(request.filter.as_deref()),
            text: active(Some(request.query.as_str())),
        }
    }

    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(user_id) = &self.user_id {
            if recipe.user_id.as_deref() != Some(user_id.as_str()) {
                return false;
            }
        }

        if let Some(fragment) = &self.title_contains {
            if !contains_folded(&recipe.title, fragment) {
                return false;
            }
        }

        if let Some(text) = &self.text {
            if !contains_folded(&recipe.title, text)
                && !any_contains_folded(&recipe.ingredients, text)
            {
                return false;
            }
        }

        true
    }
}

/// Check that a page window fits the signed range SQLite accepts
pub(crate) fn page_window(offset: u64, limit: u64) -> Result<(i64, i64)> {
    let out_of_range = |_| {
        Error::InvalidInput(format!(
            "page window out of range: offset {offset}, limit {limit}"
        ))
    };
    Ok((
        i64::try_from(offset).map_err(out_of_range)?,
        i64::try_from(limit).map_err(out_of_range)?,
    ))
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Point lookup; `Error::NotFound` when absent
    async fn get_by_id(&self, id: &str) -> Result<Recipe>;

    /// Every stored recipe in insertion order
    async fn list_all(&self) -> Result<Vec<Recipe>>;

    /// One page of recipes satisfying `filter`, with the unpaginated total
    async fn list_filtered(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Recipe>, u64)>;

    /// First recipe, in insertion order, whose title, ingredients or steps
    /// contain `query`
    async fn find_match(&self, query: &str) -> Result<Option<Recipe>> {
        let recipes = self.list_all().await?;
        Ok(recipes.into_iter().find(|r| r.matches_text(query)))
    }

    async fn create(&self, recipe: &Recipe) -> Result<()>;

    /// Insert unless a recipe with the same `query_key` exists.
    ///
    /// Returns the stored recipe and whether it was inserted by this call.
    async fn create_if_absent(&self, recipe: &Recipe) -> Result<(Recipe, bool)>;

    /// Cheap connectivity check for readiness probes
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
