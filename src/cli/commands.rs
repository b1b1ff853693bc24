use crate::api::models::ListResponse;
use crate::db::models::{Recipe, RecipeQueryResponse};
use crate::{Error, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;

/// Turn a non-success response into the matching error
async fn check(response: Response, what: &str) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(Error::NotFound(what.to_string())),
        StatusCode::BAD_REQUEST => {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["error"].as_str().unwrap_or("bad request").to_string();
            Err(Error::InvalidInput(message))
        }
        status => match response.error_for_status() {
            Err(e) => Err(Error::Http(e)),
            Ok(_) => Err(Error::Internal(format!("Unexpected status {status}"))),
        },
    }
}

/// Resolve a query through the server
pub async fn resolve(server_url: &str, query: &str) -> Result<()> {
    let client = Client::new();

    let response = client
        .post(format!("{server_url}/api/recipes/query"))
        .json(&json!({ "query": query }))
        .send()
        .await?;
    let response = check(response, "resolve endpoint").await?;

    let resolved: RecipeQueryResponse = response.json().await?;
    for recipe in &resolved.recipes {
        print_recipe(recipe);
    }

    Ok(())
}

/// List recipes page by page
pub async fn list(
    server_url: &str,
    query: Option<String>,
    user_id: Option<String>,
    filter: Option<String>,
    page: u32,
    limit: u32,
) -> Result<()> {
    let client = Client::new();

    let mut params: Vec<(&str, String)> = vec![("page", page.to_string()), ("limit", limit.to_string())];
    if let Some(query) = query {
        params.push(("query", query));
    }
    if let Some(user_id) = user_id {
        params.push(("user_id", user_id));
    }
    if let Some(filter) = filter {
        params.push(("filter", filter));
    }

    let response = client
        .get(format!("{server_url}/api/recipes"))
        .query(&params)
        .send()
        .await?;
    let response = check(response, "listing endpoint").await?;

    let listing: ListResponse = response.json().await?;

    if listing.recipes.is_empty() {
        println!("No recipes found.");
    } else {
        for recipe in &listing.recipes {
            println!("{}  {}", recipe.id, recipe.title);
        }
    }

    println!(
        "\nPage {} of {} ({} recipes total)",
        listing.pagination.page, listing.pagination.total_pages, listing.pagination.total
    );

    Ok(())
}

/// Show one recipe
pub async fn get(server_url: &str, id: &str) -> Result<()> {
    let client = Client::new();

    let response = client
        .get(format!("{server_url}/api/recipes/{id}"))
        .send()
        .await?;
    let response = check(response, &format!("Recipe {id} not found")).await?;

    let recipe: Recipe = response.json().await?;
    print_recipe(&recipe);

    Ok(())
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{label}:");
    for item in items {
        println!("  - {item}");
    }
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.title);
    println!("  ID: {}", recipe.id);
    if let Some(user_id) = &recipe.user_id {
        println!("  Owner: {user_id}");
    }
    println!("  Created: {}", recipe.created_at.to_rfc3339());

    print_list("Ingredients", &recipe.ingredients);
    print_list("Steps", &recipe.steps);
    print_list("Appliances", &recipe.appliances);

    let n = &recipe.nutritional_info;
    println!(
        "\nCalories: {:.0}, Protein: {:.0}, Carbs: {:.0}, Fat: {:.0}, Fiber: {:.0}",
        n.calories, n.protein, n.carbohydrates, n.fat, n.fiber
    );

    if !recipe.allergy_disclaimer.is_empty() {
        println!("Allergy disclaimer: {}", recipe.allergy_disclaimer);
    }
}
