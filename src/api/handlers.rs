use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    api::models::*,
    db::models::{NewRecipe, Recipe, RecipeQueryRequest, RecipeQueryResponse},
    listing::{self, FilterEngine},
    resolver::{EmbeddingUpdater, QueryResolver, RecipeGenerator},
    store::RecipeStore,
    Result,
};

/// Header an upstream authentication layer uses to pass the caller's identity
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecipeStore>,
    pub resolver: QueryResolver,
    pub listing: FilterEngine,
    pub settings: crate::config::Settings,
}

impl AppState {
    /// Wire the resolver and filter engine over one shared store
    pub fn new(
        store: Arc<dyn RecipeStore>,
        generator: Arc<dyn RecipeGenerator>,
        embeddings: Arc<dyn EmbeddingUpdater>,
        settings: crate::config::Settings,
    ) -> Self {
        let resolver =
            QueryResolver::new(store.clone(), generator, embeddings, &settings.embedding);
        let listing = FilterEngine::new(store.clone());

        Self {
            store,
            resolver,
            listing,
            settings,
        }
    }
}

/// POST /api/recipes/query - Resolve a query to exactly one recipe
pub async fn resolve_query(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<RecipeQueryResponse>> {
    debug!("Resolve request: {:?}", request);

    let response = state.resolver.resolve(&request.query).await?;
    Ok(Json(response))
}

/// GET /api/recipes - List recipes with filters and pagination
pub async fn list_recipes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    debug!("List recipes request: {:?}", params);

    let pagination = &state.settings.pagination;
    let page = params.page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = params
        .limit
        .filter(|l| *l >= 1)
        .unwrap_or(pagination.default_limit)
        .min(pagination.api_max_limit);

    let user_id = params.user_id.or_else(|| {
        headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    let request = RecipeQueryRequest {
        query: params.query.unwrap_or_default(),
        user_id,
        filter: params.filter,
        page,
        limit,
    };

    let response = state.listing.list(&request).await?;

    Ok(Json(ListResponse {
        pagination: Pagination {
            page: response.page,
            limit: response.limit,
            total: response.total,
            total_pages: listing::total_pages(response.total, response.limit, pagination.max_pages),
        },
        recipes: response.recipes,
    }))
}

/// GET /api/recipes/:id - Get a single recipe
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>> {
    debug!("Get recipe request: {}", id);

    let recipe = state.store.get_by_id(&id).await?;
    Ok(Json(recipe))
}

/// POST /api/recipes - Store a user-submitted recipe
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(new_recipe): Json<NewRecipe>,
) -> Result<(StatusCode, Json<Recipe>)> {
    let recipe = new_recipe.into_recipe(Utc::now())?;
    state.store.create(&recipe).await?;

    info!(recipe_id = %recipe.id, "Created recipe '{}'", recipe.title);
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// GET /health - Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// GET /ready - Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<ReadinessResponse>> {
    let db_healthy = state.store.ping().await.is_ok();

    Ok(Json(ReadinessResponse {
        ready: db_healthy,
        database: if db_healthy { "ok" } else { "error" }.to_string(),
    }))
}
