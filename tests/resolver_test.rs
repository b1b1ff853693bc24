use async_trait::async_trait;
use recipebook::config::EmbeddingConfig;
use recipebook::db::models::{NewRecipe, Recipe};
use recipebook::db::{init_pool, run_migrations};
use recipebook::resolver::{
    EmbeddingUpdater, LogEmbeddingUpdater, QueryResolver, RecipeGenerator, TemplateGenerator,
};
use recipebook::store::{MemoryRecipeStore, RecipeFilter, RecipeStore, SqliteRecipeStore};
use recipebook::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

async fn sqlite_store() -> Arc<SqliteRecipeStore> {
    let pool = init_pool("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Arc::new(SqliteRecipeStore::new(pool))
}

fn resolver(store: Arc<dyn RecipeStore>) -> QueryResolver {
    QueryResolver::new(
        store,
        Arc::new(TemplateGenerator),
        Arc::new(LogEmbeddingUpdater),
        &EmbeddingConfig::default(),
    )
}

/// Updater that always fails but reports each attempt
struct FailingUpdater {
    attempts: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl EmbeddingUpdater for FailingUpdater {
    async fn update(&self, recipe: &Recipe) -> Result<()> {
        let _ = self.attempts.send(recipe.id.clone());
        Err(Error::Internal("vector index unavailable".to_string()))
    }
}

struct BrokenGenerator;

#[async_trait]
impl RecipeGenerator for BrokenGenerator {
    async fn generate(&self, _query: &str) -> Result<Recipe> {
        Err(Error::Generation("model offline".to_string()))
    }
}

/// Store whose writes always fail
struct ReadOnlyStore {
    inner: MemoryRecipeStore,
}

#[async_trait]
impl RecipeStore for ReadOnlyStore {
    async fn get_by_id(&self, id: &str) -> Result<Recipe> {
        self.inner.get_by_id(id).await
    }

    async fn list_all(&self) -> Result<Vec<Recipe>> {
        self.inner.list_all().await
    }

    async fn list_filtered(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        self.inner.list_filtered(filter, offset, limit).await
    }

    async fn create(&self, _recipe: &Recipe) -> Result<()> {
        Err(Error::storage("create recipe", "database is read-only"))
    }

    async fn create_if_absent(&self, _recipe: &Recipe) -> Result<(Recipe, bool)> {
        Err(Error::storage("create recipe", "database is read-only"))
    }
}

#[tokio::test]
async fn test_empty_store_generates_and_persists() {
    let store = sqlite_store().await;
    let resolver = resolver(store.clone());

    let response = resolver.resolve("vegan tacos").await.unwrap();

    assert_eq!(response.recipes.len(), 1);
    let recipe = &response.recipes[0];
    assert_eq!(recipe.title, "vegan tacos - Generated Recipe");

    // Persisted before being returned
    let stored = store.get_by_id(&recipe.id).await.unwrap();
    assert_eq!(stored.title, recipe.title);
}

#[tokio::test]
async fn test_existing_recipe_matched_by_ingredient() {
    let store = sqlite_store().await;
    let existing = NewRecipe {
        title: "Spaghetti Bolognese".to_string(),
        ingredients: vec!["ground beef".to_string(), "tomato".to_string()],
        ..Default::default()
    }
    .into_recipe(chrono::Utc::now())
    .unwrap();
    store.create(&existing).await.unwrap();

    let response = resolver(store.clone()).resolve("beef").await.unwrap();

    assert_eq!(response.recipes.len(), 1);
    assert_eq!(response.recipes[0].id, existing.id);
    assert_eq!(store.list_all().await.unwrap().len(), 1, "no recipe created");
}

#[tokio::test]
async fn test_repeated_resolution_returns_same_recipe() {
    let store = sqlite_store().await;
    let resolver = resolver(store.clone());

    let first = resolver.resolve("Mushroom Risotto").await.unwrap();
    let second = resolver.resolve("Mushroom Risotto").await.unwrap();
    let lowercase = resolver.resolve("mushroom risotto").await.unwrap();

    assert_eq!(first.recipes[0].id, second.recipes[0].id);
    assert_eq!(first.recipes[0].id, lowercase.recipes[0].id);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_every_successful_resolution_has_one_recipe() {
    let store = sqlite_store().await;
    let resolver = resolver(store.clone());

    for query in ["pho", "pad thai", "pho", "tacos", "THAI", "x"] {
        let response = resolver.resolve(query).await.unwrap();
        assert_eq!(response.recipes.len(), 1, "query {query:?}");
    }
}

#[tokio::test]
async fn test_embedding_failure_does_not_fail_resolution() {
    let store = sqlite_store().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let resolver = QueryResolver::new(
        store.clone(),
        Arc::new(TemplateGenerator),
        Arc::new(FailingUpdater { attempts: tx }),
        &EmbeddingConfig::default(),
    );

    let response = resolver.resolve("lentil soup").await.unwrap();
    let recipe = &response.recipes[0];
    assert!(store.get_by_id(&recipe.id).await.is_ok());

    // The update was attempted in the background for the persisted recipe
    let attempted = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("embedding update should run")
        .unwrap();
    assert_eq!(attempted, recipe.id);
}

#[tokio::test]
async fn test_embedding_not_run_on_hit_or_when_disabled() {
    let store = Arc::new(MemoryRecipeStore::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let disabled = EmbeddingConfig {
        enabled: false,
        timeout_ms: 100,
    };
    let resolver = QueryResolver::new(
        store.clone(),
        Arc::new(TemplateGenerator),
        Arc::new(FailingUpdater { attempts: tx }),
        &disabled,
    );

    resolver.resolve("gazpacho").await.unwrap();
    resolver.resolve("gazpacho").await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_generator_failure_propagates_without_persisting() {
    let store = Arc::new(MemoryRecipeStore::new());
    let resolver = QueryResolver::new(
        store.clone(),
        Arc::new(BrokenGenerator),
        Arc::new(LogEmbeddingUpdater),
        &EmbeddingConfig::default(),
    );

    let result = resolver.resolve("ramen").await;

    assert!(matches!(result, Err(Error::Generation(_))));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_storage_failure_on_create_propagates() {
    let store = Arc::new(ReadOnlyStore {
        inner: MemoryRecipeStore::new(),
    });

    let result = resolver(store).resolve("ramen").await;

    assert!(matches!(result, Err(Error::Storage { .. })));
}

#[tokio::test]
async fn test_storage_failure_on_search_propagates() {
    let store = sqlite_store().await;
    store.pool().close().await;

    let result = resolver(store).resolve("ramen").await;

    assert!(matches!(result, Err(Error::Storage { .. })));
}

#[tokio::test]
async fn test_concurrent_misses_converge_on_one_recipe() {
    let store = sqlite_store().await;
    let resolver = resolver(store.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve("shakshuka").await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        ids.push(response.recipes[0].id.clone());
    }

    ids.dedup();
    assert_eq!(ids.len(), 1, "all resolutions should return one recipe");
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

async fn both_stores() -> [Arc<dyn RecipeStore>; 2] {
    [sqlite_store().await, Arc::new(MemoryRecipeStore::new())]
}

fn stored(title: &str, ingredients: &[&str]) -> Recipe {
    NewRecipe {
        title: title.to_string(),
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
    .into_recipe(chrono::Utc::now())
    .expect("Failed to build recipe")
}

#[tokio::test]
async fn test_quoted_ingredient_resolves_to_existing_recipe() {
    for store in both_stores().await {
        let pancakes = stored("Pancakes", &["flour"]);
        let burritos = stored("Burritos", &["6\" tortilla"]);
        store.create(&pancakes).await.unwrap();
        store.create(&burritos).await.unwrap();
        let resolver = resolver(store.clone());

        let response = resolver.resolve("6\" tortilla").await.unwrap();
        assert_eq!(response.recipes[0].id, burritos.id);

        // Punctuation only matches list text, never its encoding
        let response = resolver.resolve("[").await.unwrap();
        assert_ne!(response.recipes[0].id, pancakes.id);
        assert_eq!(response.recipes[0].title, "[ - Generated Recipe");

        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn test_accented_query_matches_regardless_of_case() {
    for store in both_stores().await {
        let creme = stored("Crème Brûlée", &["cream"]);
        store.create(&creme).await.unwrap();

        let response = resolver(store.clone()).resolve("CRÈME BRÛLÉE").await.unwrap();

        assert_eq!(response.recipes[0].id, creme.id);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_duplicate_query_key_rejected_by_both_stores() {
    for store in both_stores().await {
        let mut first = stored("pho - Generated Recipe", &[]);
        first.query_key = Some("pho".to_string());
        let mut second = stored("Pho", &[]);
        second.query_key = Some("pho".to_string());

        store.create(&first).await.unwrap();
        let result = store.create(&second).await;

        assert!(matches!(result, Err(Error::Storage { .. })));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}
