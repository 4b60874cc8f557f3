//! HTTP handlers for sales

use axum::{
    extract::{Path, State},
    Json,
};
use shared::Sale;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::sales::{SaleInput, SaleService};
use crate::AppState;

/// Register a sale, deducting stock atomically
pub async fn register_sale(
    State(state): State<AppState>,
    Json(input): Json<SaleInput>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.store.clone());
    let sale = service.register_sale(input).await?;
    Ok(Json(sale))
}

/// List sales, newest first
pub async fn list_sales(State(state): State<AppState>) -> Json<Vec<Sale>> {
    let service = SaleService::new(state.store.clone());
    Json(service.list().await)
}

/// Get one sale
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.store.clone());
    let sale = service.get(sale_id).await?;
    Ok(Json(sale))
}

/// Reverse a sale, restoring the consumed stock exactly
pub async fn reverse_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.store.clone());
    let sale = service.reverse_sale(sale_id).await?;
    Ok(Json(sale))
}
