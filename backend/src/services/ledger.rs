//! Ledger service
//!
//! Read side of the append-only transaction log, plus state rebuilding.
//! Appending happens through the registry's commit path; this service never
//! mutates the ledger.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{Ingredient, StockTransaction, TimeRange, TransactionKind};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{Store, StoreError};

use super::registry::weighted_average;
use super::MAX_COMMIT_RETRIES;

/// Ledger query and replay service
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
}

/// Ingredient state recomputed from the ledger alone
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RebuiltState {
    pub quantity: Decimal,
    pub avg_unit_cost: Decimal,
    pub transaction_count: usize,
}

/// Result of comparing the registry cache against a ledger replay
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyReport {
    pub ingredient_id: Uuid,
    pub cached_quantity: Decimal,
    pub cached_avg_cost: Decimal,
    pub rebuilt_quantity: Decimal,
    pub rebuilt_avg_cost: Decimal,
    pub transaction_count: usize,
    pub consistent: bool,
}

/// Replay one transaction onto `(quantity, avg)` state.
///
/// Mirrors the live application rules: purchases move the average, merge
/// markers checkpoint it, everything else shifts quantity alone. The
/// negative-stock guard is not re-applied here; replay reproduces whatever
/// the guard accepted at write time.
fn replay(quantity: Decimal, avg: Decimal, txn: &StockTransaction) -> (Decimal, Decimal) {
    let new_quantity = quantity + txn.quantity_delta;
    let new_avg = match txn.kind {
        TransactionKind::Purchase => {
            weighted_average(quantity, avg, txn.quantity_delta, txn.unit_cost)
        }
        TransactionKind::MergeAdjustment => txn.unit_cost,
        _ => avg,
    };
    (new_quantity, new_avg)
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<StockTransaction> {
        self.store
            .get_transaction(id)
            .ok_or_else(|| AppError::NotFound("Transaction".to_string()))
    }

    /// Full ledger in append order
    pub async fn list_all(&self) -> Vec<StockTransaction> {
        self.store.all_transactions()
    }

    /// Transactions for one ingredient in timestamp order
    pub async fn for_ingredient(&self, ingredient_id: Uuid) -> AppResult<Vec<StockTransaction>> {
        if self.store.get_ingredient(ingredient_id).is_none() {
            return Err(AppError::UnknownIngredient(ingredient_id));
        }
        Ok(self.store.transactions_for_ingredient(ingredient_id))
    }

    /// Transactions within a time range in timestamp order
    pub async fn in_range(&self, range: TimeRange) -> Vec<StockTransaction> {
        self.store.transactions_in_range(&range)
    }

    /// Replay all transactions for an ingredient in timestamp order,
    /// recomputing quantity and average cost from scratch.
    ///
    /// Used both for consistency verification and for recovery after a
    /// crash mid-update.
    pub async fn rebuild_ingredient_state(&self, ingredient_id: Uuid) -> AppResult<RebuiltState> {
        if self.store.get_ingredient(ingredient_id).is_none() {
            return Err(AppError::UnknownIngredient(ingredient_id));
        }
        let txns = self.store.transactions_for_ingredient(ingredient_id);
        let mut quantity = Decimal::ZERO;
        let mut avg = Decimal::ZERO;
        for txn in &txns {
            (quantity, avg) = replay(quantity, avg, txn);
        }
        Ok(RebuiltState {
            quantity,
            avg_unit_cost: avg,
            transaction_count: txns.len(),
        })
    }

    /// Compare the cached registry state against a full replay
    pub async fn verify_ingredient(&self, ingredient_id: Uuid) -> AppResult<ConsistencyReport> {
        let ingredient = self
            .store
            .get_ingredient(ingredient_id)
            .ok_or(AppError::UnknownIngredient(ingredient_id))?;
        let rebuilt = self.rebuild_ingredient_state(ingredient_id).await?;
        let consistent = ingredient.quantity == rebuilt.quantity
            && ingredient.avg_unit_cost == rebuilt.avg_unit_cost;
        if !consistent {
            tracing::warn!(
                ingredient = %ingredient.name,
                cached_qty = %ingredient.quantity,
                rebuilt_qty = %rebuilt.quantity,
                "registry cache diverges from ledger"
            );
        }
        Ok(ConsistencyReport {
            ingredient_id,
            cached_quantity: ingredient.quantity,
            cached_avg_cost: ingredient.avg_unit_cost,
            rebuilt_quantity: rebuilt.quantity,
            rebuilt_avg_cost: rebuilt.avg_unit_cost,
            transaction_count: rebuilt.transaction_count,
            consistent,
        })
    }

    /// Overwrite the cached registry state with the replayed one. Recovery
    /// path for a cache left stale by a crash between commit phases.
    pub async fn restore_from_ledger(&self, ingredient_id: Uuid) -> AppResult<Ingredient> {
        for _attempt in 0..MAX_COMMIT_RETRIES {
            let current = self
                .store
                .get_ingredient(ingredient_id)
                .ok_or(AppError::UnknownIngredient(ingredient_id))?;
            let rebuilt = self.rebuild_ingredient_state(ingredient_id).await?;

            let mut next = current.clone();
            next.quantity = rebuilt.quantity;
            next.avg_unit_cost = rebuilt.avg_unit_cost;
            next.version += 1;
            next.updated_at = chrono::Utc::now();

            match self.store.commit(vec![next.clone()], vec![]) {
                Ok(()) => {
                    tracing::info!(ingredient = %next.name, "registry cache restored from ledger");
                    return Ok(next);
                }
                Err(StoreError::VersionConflict(_)) => continue,
                Err(e) => return Err(AppError::Internal(e.to_string())),
            }
        }
        Err(AppError::ConcurrencyConflict(format!(
            "ingredient {}",
            ingredient_id
        )))
    }
}
