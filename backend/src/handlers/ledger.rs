//! HTTP handlers for ledger queries and state rebuilding

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{Ingredient, StockTransaction, TimeRange};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ledger::{ConsistencyReport, LedgerService, RebuiltState};
use crate::AppState;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl RangeQuery {
    /// An open bound defaults to the epoch or to now
    pub fn to_range(&self) -> TimeRange {
        TimeRange {
            start: self.start.unwrap_or(DateTime::UNIX_EPOCH),
            end: self.end.unwrap_or_else(Utc::now),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

/// List ledger transactions, optionally within a time range
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Json<Vec<StockTransaction>> {
    let service = LedgerService::new(state.store.clone());
    let txns = if query.is_bounded() {
        service.in_range(query.to_range()).await
    } else {
        service.list_all().await
    };
    Json(txns)
}

/// Get one ledger transaction
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<StockTransaction>> {
    let service = LedgerService::new(state.store.clone());
    let txn = service.get(transaction_id).await?;
    Ok(Json(txn))
}

/// Transactions of one ingredient in timestamp order
pub async fn get_ingredient_transactions(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockTransaction>>> {
    let service = LedgerService::new(state.store.clone());
    let txns = service.for_ingredient(ingredient_id).await?;
    Ok(Json(txns))
}

/// Recompute an ingredient's state from the ledger without touching the
/// cache
pub async fn rebuild_ingredient_state(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<RebuiltState>> {
    let service = LedgerService::new(state.store.clone());
    let rebuilt = service.rebuild_ingredient_state(ingredient_id).await?;
    Ok(Json(rebuilt))
}

/// Compare the cached state of an ingredient against a ledger replay
pub async fn verify_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<ConsistencyReport>> {
    let service = LedgerService::new(state.store.clone());
    let report = service.verify_ingredient(ingredient_id).await?;
    Ok(Json(report))
}

/// Overwrite an ingredient's cached state with the ledger replay
pub async fn restore_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let service = LedgerService::new(state.store.clone());
    let ingredient = service.restore_from_ledger(ingredient_id).await?;
    Ok(Json(ingredient))
}
