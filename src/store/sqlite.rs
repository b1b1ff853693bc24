use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use super::{page_window, RecipeFilter, RecipeStore};
use crate::db::models::{fold, Recipe, RecipeRow};
use crate::db::DbPool;
use crate::error::{Error, Result, StorageContext};

const INSERT_RECIPE: &str = r#"
    INSERT INTO recipes (
        id, title, ingredients, steps, nutritional_info,
        allergy_disclaimer, appliances, user_id, query_key,
        created_at, updated_at,
        search_title, search_ingredients, search_steps
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Recipe store backed by the SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteRecipeStore {
    pool: DbPool,
}

impl SqliteRecipeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn get_by_query_key(&self, query_key: &str) -> Result<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE query_key = ?")
            .bind(query_key)
            .fetch_optional(&self.pool)
            .await
            .storage("get recipe by query key")?
            .ok_or_else(|| {
                Error::NotFound(format!("Recipe for query '{query_key}' not found"))
            })?;

        row.try_into()
    }
}

fn push_predicates(builder: &mut QueryBuilder<'_, Sqlite>, filter: &RecipeFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(user_id) = &filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id.clone());
    }

    if let Some(fragment) = &filter.title_contains {
        builder
            .push(" AND instr(search_title, ")
            .push_bind(fold(fragment))
            .push(") > 0");
    }

    if let Some(text) = &filter.text {
        let needle = fold(text);
        builder
            .push(" AND (instr(search_title, ")
            .push_bind(needle.clone())
            .push(") > 0 OR EXISTS (SELECT 1 FROM json_each(recipes.search_ingredients)")
            .push(" WHERE instr(value, ")
            .push_bind(needle)
            .push(") > 0))");
    }
}

fn decode_all(rows: Vec<RecipeRow>) -> Result<Vec<Recipe>> {
    rows.into_iter().map(Recipe::try_from).collect()
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn get_by_id(&self, id: &str) -> Result<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .storage(&format!("get recipe {id}"))?
            .ok_or_else(|| Error::NotFound(format!("Recipe {id} not found")))?;

        row.try_into()
    }

    async fn list_all(&self) -> Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes ORDER BY seq")
            .fetch_all(&self.pool)
            .await
            .storage("list recipes")?;

        decode_all(rows)
    }

    async fn list_filtered(
        &self,
        filter: &RecipeFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Recipe>, u64)> {
        debug!(?filter, offset, limit, "Listing recipes");
        let (offset, limit) = page_window(offset, limit)?;

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes");
        push_predicates(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .storage("count recipes")?;

        let mut page_query = QueryBuilder::<Sqlite>::new("SELECT * FROM recipes");
        push_predicates(&mut page_query, filter);
        page_query
            .push(" ORDER BY seq LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = page_query
            .build_query_as::<RecipeRow>()
            .fetch_all(&self.pool)
            .await
            .storage("query recipes")?;

        Ok((decode_all(rows)?, total as u64))
    }

    async fn find_match(&self, query: &str) -> Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r#"
            SELECT * FROM recipes
            WHERE instr(search_title, ?1) > 0
               OR EXISTS (
                   SELECT 1 FROM json_each(recipes.search_ingredients)
                   WHERE instr(value, ?1) > 0
               )
               OR EXISTS (
                   SELECT 1 FROM json_each(recipes.search_steps)
                   WHERE instr(value, ?1) > 0
               )
            ORDER BY seq
            LIMIT 1
            "#,
        )
        .bind(fold(query))
        .fetch_optional(&self.pool)
        .await
        .storage("search recipes")?;

        row.map(Recipe::try_from).transpose()
    }

    async fn create(&self, recipe: &Recipe) -> Result<()> {
        let row = RecipeRow::from(recipe);

        sqlx::query(INSERT_RECIPE)
            .bind(&row.id)
            .bind(&row.title)
            .bind(&row.ingredients)
            .bind(&row.steps)
            .bind(&row.nutritional_info)
            .bind(&row.allergy_disclaimer)
            .bind(&row.appliances)
            .bind(&row.user_id)
            .bind(&row.query_key)
            .bind(row.created_at)
            .bind(row.updated_at)
            .bind(&row.search_title)
            .bind(&row.search_ingredients)
            .bind(&row.search_steps)
            .execute(&self.pool)
            .await
            .storage(&format!("create recipe {}", row.id))?;

        Ok(())
    }

    async fn create_if_absent(&self, recipe: &Recipe) -> Result<(Recipe, bool)> {
        let Some(query_key) = recipe.query_key.as_deref() else {
            self.create(recipe).await?;
            return Ok((recipe.clone(), true));
        };

        let row = RecipeRow::from(recipe);
        let sql = format!("{INSERT_RECIPE} ON CONFLICT(query_key) DO NOTHING RETURNING *");

        let inserted = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(&row.id)
            .bind(&row.title)
            .bind(&row.ingredients)
            .bind(&row.steps)
            .bind(&row.nutritional_info)
            .bind(&row.allergy_disclaimer)
            .bind(&row.appliances)
            .bind(&row.user_id)
            .bind(&row.query_key)
            .bind(row.created_at)
            .bind(row.updated_at)
            .bind(&row.search_title)
            .bind(&row.search_ingredients)
            .bind(&row.search_steps)
            .fetch_optional(&self.pool)
            .await
            .storage(&format!("create recipe {}", row.id))?;

        match inserted {
            Some(row) => Ok((Recipe::try_from(row)?, true)),
            None => {
                debug!("Recipe for query key '{}' already stored", query_key);
                Ok((self.get_by_query_key(query_key).await?, false))
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .storage("ping")?;
        Ok(())
    }
}
