//! HTTP handlers for the ingredient registry

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::Ingredient;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::merge::{MergeOutcome, MergeService};
use crate::services::registry::{CorrectionInput, CreateIngredientInput, IngredientService};
use crate::AppState;

#[derive(Deserialize)]
pub struct ListIngredientsQuery {
    /// Include merged aliases alongside active ingredients
    #[serde(default)]
    pub include_merged: bool,
}

#[derive(Deserialize)]
pub struct MergeInput {
    pub source_id: Uuid,
    pub target_id: Uuid,
}

#[derive(Serialize)]
pub struct CostResponse {
    pub ingredient_id: Uuid,
    pub avg_unit_cost: Decimal,
}

/// Create an ingredient, optionally with an opening balance
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(input): Json<CreateIngredientInput>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.store.clone());
    let ingredient = service.create(input).await?;
    Ok(Json(ingredient))
}

/// List ingredients
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<ListIngredientsQuery>,
) -> Json<Vec<Ingredient>> {
    let service = IngredientService::new(state.store.clone());
    let ingredients = if query.include_merged {
        service.list_all().await
    } else {
        service.list_active().await
    };
    Json(ingredients)
}

/// Get one ingredient by id, merged aliases included
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.store.clone());
    let ingredient = service.lookup(ingredient_id).await?;
    Ok(Json(ingredient))
}

/// Resolve an ingredient to its canonical identity through merge aliases
pub async fn resolve_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.store.clone());
    let ingredient = service.resolve_canonical(ingredient_id).await?;
    Ok(Json(ingredient))
}

/// Current weighted-average unit cost of an ingredient
pub async fn get_ingredient_cost(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<CostResponse>> {
    let service = IngredientService::new(state.store.clone());
    let avg_unit_cost = service.current_cost(ingredient_id).await?;
    Ok(Json(CostResponse {
        ingredient_id,
        avg_unit_cost,
    }))
}

/// Record a manual stock correction
pub async fn record_correction(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
    Json(input): Json<CorrectionInput>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.store.clone());
    let ingredient = service.record_correction(ingredient_id, input).await?;
    Ok(Json(ingredient))
}

/// Merge one ingredient into another
pub async fn merge_ingredients(
    State(state): State<AppState>,
    Json(input): Json<MergeInput>,
) -> AppResult<Json<MergeOutcome>> {
    let service = MergeService::new(state.store.clone());
    let outcome = service.merge(input.source_id, input.target_id).await?;
    Ok(Json(outcome))
}
