use mockito::Matcher;
use recipebook::config::EmbeddingConfig;
use recipebook::resolver::{LogEmbeddingUpdater, QueryResolver, RecipeGenerator, RemoteGenerator};
use recipebook::store::{MemoryRecipeStore, RecipeStore};
use recipebook::Error;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn generator(server: &mockito::ServerGuard) -> RemoteGenerator {
    RemoteGenerator::new(format!("{}/resolve", server.url()), Duration::from_secs(5))
        .expect("Failed to build generator")
}

#[tokio::test]
async fn test_primary_recipe_is_used() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/resolve")
        .match_body(Matcher::Json(json!({ "query": "green curry" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "primary_recipe": {
                    "title": "Thai Green Curry",
                    "ingredients": ["coconut milk", "green curry paste"],
                    "steps": ["Simmer everything"],
                    "nutritional_info": { "calories": 450.0, "protein": 12.5 },
                    "allergy_disclaimer": "Contains shellfish",
                    "appliances": ["wok"]
                },
                "alternative_recipes": [{ "title": "Red Curry" }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let recipe = generator(&server).generate("green curry").await.unwrap();

    mock.assert_async().await;
    assert_eq!(recipe.title, "Thai Green Curry");
    assert_eq!(recipe.ingredients.len(), 2);
    assert_eq!(recipe.steps, vec!["Simmer everything".to_string()]);
    assert_eq!(recipe.nutritional_info.calories, 450.0);
    assert_eq!(recipe.nutritional_info.fat, 0.0);
    assert_eq!(recipe.allergy_disclaimer, "Contains shellfish");
    assert_eq!(recipe.appliances, vec!["wok".to_string()]);
    assert!(recipe.user_id.is_none());
    assert!(uuid::Uuid::parse_str(&recipe.id).is_ok());
}

#[tokio::test]
async fn test_error_status_is_generation_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/resolve")
        .with_status(503)
        .create_async()
        .await;

    let result = generator(&server).generate("green curry").await;

    assert!(matches!(result, Err(Error::Generation(_))));
}

#[tokio::test]
async fn test_missing_primary_recipe_is_generation_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/resolve")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"alternative_recipes":[]}"#)
        .create_async()
        .await;

    let result = generator(&server).generate("green curry").await;

    assert!(matches!(result, Err(Error::Generation(_))));
}

#[tokio::test]
async fn test_malformed_body_is_generation_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/resolve")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let result = generator(&server).generate("green curry").await;

    assert!(matches!(result, Err(Error::Generation(_))));
}

#[tokio::test]
async fn test_resolver_calls_service_once_per_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/resolve")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"primary_recipe":{"title":"Beef Pho","ingredients":["rice noodles"]}}"#)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(MemoryRecipeStore::new());
    let resolver = QueryResolver::new(
        store.clone(),
        Arc::new(generator(&server)),
        Arc::new(LogEmbeddingUpdater),
        &EmbeddingConfig::default(),
    );

    let first = resolver.resolve("pho").await.unwrap();
    let second = resolver.resolve("pho").await.unwrap();

    mock.assert_async().await;
    assert_eq!(first.recipes[0].id, second.recipes[0].id);
    assert_eq!(first.recipes[0].title, "Beef Pho");
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_generation_stores_nothing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/resolve")
        .with_status(500)
        .create_async()
        .await;

    let store = Arc::new(MemoryRecipeStore::new());
    let resolver = QueryResolver::new(
        store.clone(),
        Arc::new(generator(&server)),
        Arc::new(LogEmbeddingUpdater),
        &EmbeddingConfig::default(),
    );

    assert!(matches!(
        resolver.resolve("pho").await,
        Err(Error::Generation(_))
    ));
    assert!(store.is_empty().await);
}
