use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GeneratorConfig, GeneratorMode};
use crate::db::models::{NutritionalInfo, Recipe};
use crate::error::{Error, Result};

/// Produces an unpersisted candidate recipe for a query nothing matched
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate(&self, query: &str) -> Result<Recipe>;
}

/// Build the generator selected by configuration
pub fn from_config(config: &GeneratorConfig) -> Result<Arc<dyn RecipeGenerator>> {
    match config.mode {
        GeneratorMode::Template => Ok(Arc::new(TemplateGenerator)),
        GeneratorMode::Remote => {
            let url = config.resolver_url.clone().ok_or_else(|| {
                Error::Config("RESOLVER_URL is required when GENERATOR_MODE=remote".to_string())
            })?;
            Ok(Arc::new(RemoteGenerator::new(url, config.timeout())?))
        }
    }
}

fn empty_recipe(title: String) -> Recipe {
    let now = Utc::now();
    Recipe {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        ingredients: Vec::new(),
        steps: Vec::new(),
        nutritional_info: NutritionalInfo::default(),
        allergy_disclaimer: String::new(),
        appliances: Vec::new(),
        user_id: None,
        query_key: None,
        created_at: now,
        updated_at: now,
    }
}

/// Placeholder generator: titles the recipe after the query, leaves content empty
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

#[async_trait]
impl RecipeGenerator for TemplateGenerator {
    async fn generate(&self, query: &str) -> Result<Recipe> {
        Ok(empty_recipe(format!("{query} - Generated Recipe")))
    }
}

#[derive(Debug, Serialize)]
struct ResolutionRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResolutionResponse {
    primary_recipe: Option<GeneratedRecipe>,
    #[serde(default)]
    alternative_recipes: Vec<GeneratedRecipe>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedRecipe {
    title: String,
    ingredients: Vec<String>,
    steps: Vec<String>,
    nutritional_info: NutritionalInfo,
    allergy_disclaimer: String,
    appliances: Vec<String>,
}

/// Generator that delegates to an external resolver service.
///
/// The service receives `{"query": ...}` and answers with a
/// `primary_recipe` plus optional `alternative_recipes`; only the primary
/// recipe is kept. IDs and timestamps are always assigned locally.
#[derive(Debug, Clone)]
pub struct RemoteGenerator {
    client: Client,
    url: String,
}

impl RemoteGenerator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("recipebook/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RecipeGenerator for RemoteGenerator {
    async fn generate(&self, query: &str) -> Result<Recipe> {
        let response = self
            .client
            .post(&self.url)
            .json(&ResolutionRequest { query })
            .send()
            .await
            .map_err(|e| Error::Generation(format!("resolver service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Generation(format!(
                "resolver service returned status code: {}",
                status.as_u16()
            )));
        }

        let body: ResolutionResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("invalid resolver response: {e}")))?;

        debug!(
            "Resolver returned {} alternative recipe(s)",
            body.alternative_recipes.len()
        );

        let generated = body
            .primary_recipe
            .ok_or_else(|| Error::Generation("resolver returned no primary recipe".to_string()))?;

        let title = generated.title.trim();
        if title.is_empty() {
            return Err(Error::Generation(
                "resolver returned a recipe without a title".to_string(),
            ));
        }

        let mut recipe = empty_recipe(title.to_string());
        recipe.ingredients = generated.ingredients;
        recipe.steps = generated.steps;
        recipe.nutritional_info = generated.nutritional_info;
        recipe.allergy_disclaimer = generated.allergy_disclaimer;
        recipe.appliances = generated.appliances;
        Ok(recipe)
    }
}
