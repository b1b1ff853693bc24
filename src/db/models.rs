use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-serving nutrition facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionalInfo {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub fiber: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub nutritional_info: NutritionalInfo,
    pub allergy_disclaimer: String,
    pub appliances: Vec<String>,
    pub user_id: Option<String>,
    /// Normalized query this recipe was generated for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Whether the title or any ingredient or step contains `query`,
    /// ignoring case.
    pub fn matches_text(&self, query: &str) -> bool {
        contains_folded(&self.title, query)
            || any_contains_folded(&self.ingredients, query)
            || any_contains_folded(&self.steps, query)
    }
}

/// Explicit recipe submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub nutritional_info: NutritionalInfo,
    #[serde(default)]
    pub allergy_disclaimer: String,
    #[serde(default)]
    pub appliances: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl NewRecipe {
    /// Assign an ID and timestamps, rejecting an empty title
    pub fn into_recipe(self, now: DateTime<Utc>) -> Result<Recipe> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput(
                "recipe title cannot be empty".to_string(),
            ));
        }

        Ok(Recipe {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            ingredients: self.ingredients,
            steps: self.steps,
            nutritional_info: self.nutritional_info,
            allergy_disclaimer: self.allergy_disclaimer,
            appliances: self.appliances,
            user_id: self.user_id.filter(|u| !u.is_empty()),
            query_key: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Row shape of the `recipes` table; list fields are JSON text
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: String,
    pub title: String,
    pub ingredients: String,
    pub steps: String,
    pub nutritional_info: String,
    pub allergy_disclaimer: String,
    pub appliances: String,
    pub user_id: Option<String>,
    pub query_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Lowercased title, matched by text search
    pub search_title: String,
    /// Lowercased ingredients as a JSON array
    pub search_ingredients: String,
    /// Lowercased steps as a JSON array
    pub search_steps: String,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = Error;

    fn try_from(row: RecipeRow) -> Result<Self> {
        let decode = |e: serde_json::Error| Error::storage(format!("decode recipe {}", row.id), e);

        Ok(Recipe {
            ingredients: serde_json::from_str(&row.ingredients).map_err(decode)?,
            steps: serde_json::from_str(&row.steps).map_err(decode)?,
            nutritional_info: serde_json::from_str(&row.nutritional_info).map_err(decode)?,
            appliances: serde_json::from_str(&row.appliances).map_err(decode)?,
            id: row.id,
            title: row.title,
            allergy_disclaimer: row.allergy_disclaimer,
            user_id: row.user_id,
            query_key: row.query_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Recipe> for RecipeRow {
    fn from(recipe: &Recipe) -> Self {
        RecipeRow {
            id: recipe.id.clone(),
            title: recipe.title.clone(),
            ingredients: json_list(&recipe.ingredients),
            steps: json_list(&recipe.steps),
            nutritional_info: serde_json::to_string(&recipe.nutritional_info)
                .unwrap_or_else(|_| "{}".to_string()),
            allergy_disclaimer: recipe.allergy_disclaimer.clone(),
            appliances: json_list(&recipe.appliances),
            user_id: recipe.user_id.clone(),
            query_key: recipe.query_key.clone(),
            created_at: recipe.created_at,
            updated_at: recipe.updated_at,
            search_title: fold(&recipe.title),
            search_ingredients: folded_list(&recipe.ingredients),
            search_steps: folded_list(&recipe.steps),
        }
    }
}

/// Request for a filtered, paginated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeQueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl RecipeQueryRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            query: String::new(),
            user_id: None,
            filter: None,
            page,
            limit,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeQueryResponse {
    pub recipes: Vec<Recipe>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl RecipeQueryResponse {
    /// Response carrying exactly one recipe
    pub fn single(recipe: Recipe) -> Self {
        Self {
            recipes: vec![recipe],
            page: 1,
            limit: 1,
            total: 1,
        }
    }
}

/// Lowercase a query and collapse its whitespace
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn folded_list(items: &[String]) -> String {
    let folded: Vec<String> = items.iter().map(|i| fold(i)).collect();
    json_list(&folded)
}

/// Unicode lowercase; the only case folding text search uses
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

pub(crate) fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

/// Whether any single element contains `needle`, ignoring case
pub(crate) fn any_contains_folded(items: &[String], needle: &str) -> bool {
    let needle = fold(needle);
    items.iter().any(|item| fold(item).contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Recipe {
        NewRecipe {
            title: "Spaghetti Bolognese".to_string(),
            ingredients: vec!["ground beef".to_string(), "spaghetti".to_string()],
            steps: vec!["Brown the meat".to_string()],
            ..Default::default()
        }
        .into_recipe(Utc::now())
        .unwrap()
    }

    #[test]
    fn test_matches_text_across_fields() {
        let recipe = sample();
        assert!(recipe.matches_text("BOLOGNESE"));
        assert!(recipe.matches_text("beef"));
        assert!(recipe.matches_text("brown the"));
        assert!(!recipe.matches_text("tofu"));
    }

    #[test]
    fn test_matches_text_per_element() {
        let mut recipe = sample();
        recipe.ingredients = vec!["6\" tortilla".to_string(), "beans".to_string()];

        assert!(recipe.matches_text("6\" TORTILLA"));
        assert!(!recipe.matches_text("["));
        assert!(!recipe.matches_text("\","));
        // Elements are matched one at a time, never across a boundary
        assert!(!recipe.matches_text("tortilla beans"));
    }

    #[test]
    fn test_matches_text_folds_unicode() {
        let mut recipe = sample();
        recipe.title = "Crème Brûlée".to_string();
        recipe.steps = vec!["Torch the SUCRE GLACÉ".to_string()];

        assert!(recipe.matches_text("CRÈME BRÛLÉE"));
        assert!(recipe.matches_text("sucre glacé"));
    }

    #[test]
    fn test_row_carries_folded_search_columns() {
        let mut recipe = sample();
        recipe.title = "Crème BRÛLÉE".to_string();
        let row = RecipeRow::from(&recipe);

        assert_eq!(row.search_title, "crème brûlée");
        assert_eq!(row.search_ingredients, r#"["ground beef","spaghetti"]"#);
        assert_eq!(row.search_steps, r#"["brown the meat"]"#);
    }

    #[test]
    fn test_empty_title_rejected() {
        let result = NewRecipe {
            title: "   ".to_string(),
            ..Default::default()
        }
        .into_recipe(Utc::now());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_row_conversion_preserves_fields() {
        let mut recipe = sample();
        recipe.nutritional_info.calories = 640.0;
        recipe.user_id = Some("u1".to_string());

        let back = Recipe::try_from(RecipeRow::from(&recipe)).unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn test_corrupt_row_is_storage_error() {
        let mut row = RecipeRow::from(&sample());
        row.steps = "not json".to_string();
        assert!(matches!(
            Recipe::try_from(row),
            Err(Error::Storage { .. })
        ));
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Vegan   TACOS "), "vegan tacos");
        assert_eq!(normalize_query(""), "");
    }

    #[test]
    fn test_nutrition_defaults_from_empty_object() {
        let info: NutritionalInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, NutritionalInfo::default());
    }
}
