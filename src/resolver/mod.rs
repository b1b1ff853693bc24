//! Match-or-generate resolution of free-text recipe queries.
//!
//! A query is first matched against stored recipes (title or any single
//! ingredient or step, case-insensitive, first hit in insertion order). On a
//! miss a recipe is generated, persisted, and only then returned; the
//! embedding update that follows is best effort.
//!
//! Generated recipes carry the normalized query as a unique key, so
//! concurrent misses for the same query converge on a single stored row
//! instead of racing to insert duplicates.

pub mod embedding;
pub mod generator;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::EmbeddingConfig;
use crate::db::models::{normalize_query, RecipeQueryResponse};
use crate::error::{Error, Result};
use crate::store::RecipeStore;

pub use embedding::{EmbeddingUpdater, LogEmbeddingUpdater};
pub use generator::{RecipeGenerator, RemoteGenerator, TemplateGenerator};

#[derive(Clone)]
pub struct QueryResolver {
    store: Arc<dyn RecipeStore>,
    generator: Arc<dyn RecipeGenerator>,
    embeddings: Option<Arc<dyn EmbeddingUpdater>>,
    embedding_timeout: Duration,
}

impl QueryResolver {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        generator: Arc<dyn RecipeGenerator>,
        embeddings: Arc<dyn EmbeddingUpdater>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            store,
            generator,
            embeddings: config.enabled.then_some(embeddings),
            embedding_timeout: config.timeout(),
        }
    }

    /// Resolve `query` to exactly one stored recipe
    pub async fn resolve(&self, query: &str) -> Result<RecipeQueryResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".to_string()));
        }

        if let Some(recipe) = self.store.find_match(query).await? {
            debug!(recipe_id = %recipe.id, "Query '{}' matched stored recipe", query);
            return Ok(RecipeQueryResponse::single(recipe));
        }

        info!("No stored recipe matches '{}', generating one", query);

        let mut candidate = self.generator.generate(query).await?;
        if candidate.title.trim().is_empty() {
            return Err(Error::Generation(
                "generator produced a recipe without a title".to_string(),
            ));
        }
        candidate.query_key = Some(normalize_query(query));

        let (recipe, inserted) = self.store.create_if_absent(&candidate).await?;

        if inserted {
            info!(recipe_id = %recipe.id, "Stored generated recipe '{}'", recipe.title);
            if let Some(updater) = &self.embeddings {
                embedding::spawn_update(updater.clone(), recipe.clone(), self.embedding_timeout);
            }
        } else {
            debug!(recipe_id = %recipe.id, "Concurrent resolution already stored this query");
        }

        Ok(RecipeQueryResponse::single(recipe))
    }
}
