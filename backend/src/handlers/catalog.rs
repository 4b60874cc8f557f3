//! HTTP handlers for recipes and published products

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{Product, Recipe};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::catalog::{CatalogService, PricedRecipe, RecipeInput};
use crate::AppState;

/// Create a recipe
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<RecipeInput>,
) -> AppResult<Json<PricedRecipe>> {
    let service = CatalogService::new(state.store.clone());
    let priced = service.create_recipe(input).await?;
    Ok(Json(priced))
}

/// List recipes sorted by name
pub async fn list_recipes(State(state): State<AppState>) -> Json<Vec<Recipe>> {
    let service = CatalogService::new(state.store.clone());
    Json(service.list_recipes().await)
}

/// Get one recipe
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<Recipe>> {
    let service = CatalogService::new(state.store.clone());
    let recipe = service.get_recipe(recipe_id).await?;
    Ok(Json(recipe))
}

/// Replace a recipe's contents and re-solve its pricing
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
    Json(input): Json<RecipeInput>,
) -> AppResult<Json<PricedRecipe>> {
    let service = CatalogService::new(state.store.clone());
    let priced = service.update_recipe(recipe_id, input).await?;
    Ok(Json(priced))
}

/// Delete a recipe
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = CatalogService::new(state.store.clone());
    service.delete_recipe(recipe_id).await?;
    Ok(Json(()))
}

/// Re-cost a recipe at current registry prices
pub async fn reprice_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<PricedRecipe>> {
    let service = CatalogService::new(state.store.clone());
    let priced = service.reprice_recipe(recipe_id).await?;
    Ok(Json(priced))
}

/// Publish a recipe as a sellable product snapshot
pub async fn publish_product(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.store.clone());
    let product = service.publish_product(recipe_id).await?;
    Ok(Json(product))
}

/// List published products sorted by name
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    let service = CatalogService::new(state.store.clone());
    Json(service.list_products().await)
}

/// Get one published product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.store.clone());
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}
