//! HTTP handlers for waste events

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{WasteEvent, WasteReason};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::waste::{IngredientWasteInput, ProductWasteInput, WasteService};
use crate::AppState;

/// Register a raw-ingredient loss
pub async fn register_ingredient_waste(
    State(state): State<AppState>,
    Json(input): Json<IngredientWasteInput>,
) -> AppResult<Json<WasteEvent>> {
    let service = WasteService::new(state.store.clone());
    let event = service.register_ingredient_waste(input).await?;
    Ok(Json(event))
}

/// Register a finished-product loss
pub async fn register_product_waste(
    State(state): State<AppState>,
    Json(input): Json<ProductWasteInput>,
) -> AppResult<Json<WasteEvent>> {
    let service = WasteService::new(state.store.clone());
    let event = service.register_product_waste(input).await?;
    Ok(Json(event))
}

/// List waste events, newest first
pub async fn list_waste_events(State(state): State<AppState>) -> Json<Vec<WasteEvent>> {
    let service = WasteService::new(state.store.clone());
    Json(service.list().await)
}

/// Get one waste event
pub async fn get_waste_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<WasteEvent>> {
    let service = WasteService::new(state.store.clone());
    let event = service.get(event_id).await?;
    Ok(Json(event))
}

/// Reverse a waste event, restoring the lost stock exactly
pub async fn reverse_waste_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<WasteEvent>> {
    let service = WasteService::new(state.store.clone());
    let event = service.reverse_waste(event_id).await?;
    Ok(Json(event))
}

/// The supported waste reason taxonomy
pub async fn list_waste_reasons() -> Json<Vec<WasteReason>> {
    Json(WasteReason::ALL.to_vec())
}
