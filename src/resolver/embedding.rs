//! Semantic index side channel.
//!
//! Updates run on a detached task with a deadline. Their outcome is only
//! ever logged; nothing flows back to the request that triggered them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::models::Recipe;
use crate::error::Result;

#[async_trait]
pub trait EmbeddingUpdater: Send + Sync {
    async fn update(&self, recipe: &Recipe) -> Result<()>;
}

/// Stub updater; records the request and succeeds
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmbeddingUpdater;

#[async_trait]
impl EmbeddingUpdater for LogEmbeddingUpdater {
    async fn update(&self, recipe: &Recipe) -> Result<()> {
        info!(recipe_id = %recipe.id, "Vector embedding update for recipe (stub)");
        Ok(())
    }
}

/// Run `updater` for `recipe` in the background, bounded by `timeout`
pub fn spawn_update(
    updater: Arc<dyn EmbeddingUpdater>,
    recipe: Recipe,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, updater.update(&recipe)).await {
            Ok(Ok(())) => debug!(recipe_id = %recipe.id, "Embedding updated"),
            Ok(Err(e)) => warn!(
                recipe_id = %recipe.id,
                "Vector DB update failed: {}",
                e.log_safe()
            ),
            Err(_) => warn!(
                recipe_id = %recipe.id,
                "Vector DB update timed out after {:?}",
                timeout
            ),
        }
    })
}
