//! Ingredient registry service
//!
//! Owns the canonical ingredient catalog and the cached quantity and
//! weighted-average cost each ingredient carries. The cache is a reduction
//! of the ledger; every change goes through an optimistic-concurrency commit
//! that writes the updated cache and the ledger entry together.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    normalize_name, validate_cost, validate_quantity, Ingredient, StockTransaction,
    TransactionKind, UnitCategory,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{Store, StoreError};

use super::MAX_COMMIT_RETRIES;

/// Registry service for ingredient identity and cached stock state
#[derive(Clone)]
pub struct IngredientService {
    store: Arc<dyn Store>,
}

/// Input for creating an ingredient
#[derive(Debug, Deserialize)]
pub struct CreateIngredientInput {
    pub name: String,
    pub category: UnitCategory,
    /// Optional opening stock, recorded as a purchase so the average cost
    /// starts from a real value
    pub opening_quantity: Option<Decimal>,
    pub opening_unit_cost: Option<Decimal>,
}

/// Input for a manual stock correction
#[derive(Debug, Deserialize)]
pub struct CorrectionInput {
    /// Signed delta in base units; corrections may drive stock negative to
    /// record previously unlogged inventory
    pub quantity_delta: Decimal,
    pub note: Option<String>,
}

/// Weighted-average cost after a purchase of `quantity` at `unit_cost` into
/// existing stock `(old_quantity, old_avg)`.
///
/// When there is no positive existing stock the incoming price becomes the
/// average outright.
pub fn weighted_average(
    old_quantity: Decimal,
    old_avg: Decimal,
    quantity: Decimal,
    unit_cost: Decimal,
) -> Decimal {
    let combined = old_quantity + quantity;
    if old_quantity <= Decimal::ZERO || combined <= Decimal::ZERO {
        return unit_cost;
    }
    (old_quantity * old_avg + quantity * unit_cost) / combined
}

/// Compute the ingredient state after one transaction.
///
/// Pure: the same rules drive live application and ledger replay. Only
/// purchases move the average; merge-adjustment markers checkpoint it; all
/// other kinds shift quantity alone.
pub fn next_state(ingredient: &Ingredient, txn: &StockTransaction) -> AppResult<Ingredient> {
    let new_quantity = ingredient.quantity + txn.quantity_delta;
    if new_quantity < Decimal::ZERO && !txn.is_correction() {
        return Err(AppError::InsufficientStock {
            ingredient: ingredient.name.clone(),
            requested: -txn.quantity_delta,
            available: ingredient.quantity,
        });
    }

    let new_avg = match txn.kind {
        TransactionKind::Purchase => weighted_average(
            ingredient.quantity,
            ingredient.avg_unit_cost,
            txn.quantity_delta,
            txn.unit_cost,
        ),
        TransactionKind::MergeAdjustment => txn.unit_cost,
        TransactionKind::SaleConsumption
        | TransactionKind::Waste
        | TransactionKind::ManualCorrection => ingredient.avg_unit_cost,
    };

    let mut next = ingredient.clone();
    next.quantity = new_quantity;
    next.avg_unit_cost = new_avg;
    next.version += 1;
    next.updated_at = Utc::now();
    Ok(next)
}

impl IngredientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an ingredient, optionally with an opening balance
    pub async fn create(&self, input: CreateIngredientInput) -> AppResult<Ingredient> {
        let name = normalize_name(&input.name);
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Ingredient name is required".to_string(),
                message_pt: "O nome do ingrediente é obrigatório".to_string(),
            });
        }
        // validate the opening balance before anything is written, so a
        // rejected create leaves no registry entry behind
        let opening = match (input.opening_quantity, input.opening_unit_cost) {
            (None, _) => None,
            (Some(quantity), unit_cost) => {
                validate_quantity(quantity).map_err(|msg| AppError::Validation {
                    field: "opening_quantity".to_string(),
                    message: msg.to_string(),
                    message_pt: "A quantidade inicial deve ser positiva".to_string(),
                })?;
                let unit_cost = unit_cost.unwrap_or(Decimal::ZERO);
                validate_cost(unit_cost).map_err(|msg| AppError::Validation {
                    field: "opening_unit_cost".to_string(),
                    message: msg.to_string(),
                    message_pt: "O custo inicial não pode ser negativo".to_string(),
                })?;
                Some((quantity, unit_cost))
            }
        };

        if let Some(existing) = self.store.find_ingredient_by_name(&name) {
            if existing.is_active() {
                return Err(AppError::DuplicateEntry(name));
            }
        }

        let ingredient = Ingredient::new(name, input.category);
        self.store
            .insert_ingredient(ingredient.clone())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        tracing::info!(ingredient = %ingredient.name, id = %ingredient.id, "ingredient created");

        match opening {
            None => Ok(ingredient),
            Some((quantity, unit_cost)) => {
                let txn = StockTransaction::new(TransactionKind::Purchase, ingredient.id, quantity)
                    .with_unit_cost(unit_cost)
                    .with_note("opening balance");
                self.apply_transaction(txn).await
            }
        }
    }

    /// Look up an ingredient by id, without resolving merge aliases
    pub async fn lookup(&self, id: Uuid) -> AppResult<Ingredient> {
        self.store
            .get_ingredient(id)
            .ok_or(AppError::UnknownIngredient(id))
    }

    /// Resolve an ingredient to its canonical identity, following merge
    /// aliases. Historical references to merged ingredients resolve here.
    pub async fn resolve_canonical(&self, id: Uuid) -> AppResult<Ingredient> {
        let mut current = self.lookup(id).await?;
        // merge chains are short; the bound only guards a corrupted store
        for _ in 0..32 {
            match current.merged_into {
                Some(target) => current = self.lookup(target).await?,
                None => return Ok(current),
            }
        }
        Err(AppError::Internal(format!(
            "merge alias chain too deep for ingredient {}",
            id
        )))
    }

    /// Active ingredients, selectable for new entries
    pub async fn list_active(&self) -> Vec<Ingredient> {
        self.store
            .list_ingredients()
            .into_iter()
            .filter(|i| i.is_active())
            .collect()
    }

    /// Every ingredient, merged aliases included
    pub async fn list_all(&self) -> Vec<Ingredient> {
        self.store.list_ingredients()
    }

    /// Current weighted-average unit cost of the canonical ingredient
    pub async fn current_cost(&self, id: Uuid) -> AppResult<Decimal> {
        Ok(self.resolve_canonical(id).await?.avg_unit_cost)
    }

    /// Apply a transaction to the registry cache and append it to the
    /// ledger, atomically, with bounded optimistic retry.
    ///
    /// Idempotent by transaction id: re-applying an already appended
    /// transaction has no additional effect, which tolerates retry after a
    /// partial failure upstream.
    pub async fn apply_transaction(&self, mut txn: StockTransaction) -> AppResult<Ingredient> {
        if self.store.get_transaction(txn.id).is_some() {
            return self.lookup(txn.ingredient_id).await;
        }

        for _attempt in 0..MAX_COMMIT_RETRIES {
            let current = self.lookup(txn.ingredient_id).await?;
            if !current.is_active() {
                return Err(AppError::Validation {
                    field: "ingredient_id".to_string(),
                    message: format!("{} was merged and is no longer selectable", current.name),
                    message_pt: format!(
                        "{} foi unificado e não pode mais receber lançamentos",
                        current.name
                    ),
                });
            }

            // consumption, waste and corrections inherit the average in
            // effect at commit time; reversals keep the original's cost
            if txn.reverses.is_none()
                && !matches!(
                    txn.kind,
                    TransactionKind::Purchase | TransactionKind::MergeAdjustment
                )
            {
                txn.unit_cost = current.avg_unit_cost;
            }

            let next = next_state(&current, &txn)?;
            match self.store.commit(vec![next.clone()], vec![txn.clone()]) {
                Ok(()) => {
                    tracing::debug!(
                        ingredient = %next.name,
                        kind = ?txn.kind,
                        delta = %txn.quantity_delta,
                        "transaction applied"
                    );
                    return Ok(next);
                }
                Err(StoreError::VersionConflict(_)) => continue,
                Err(e) => return Err(AppError::Internal(e.to_string())),
            }
        }
        Err(AppError::ConcurrencyConflict(format!(
            "ingredient {}",
            txn.ingredient_id
        )))
    }

    /// Apply a batch of transactions across several ingredients in one
    /// atomic commit: either every cache update and every ledger append
    /// lands, or none do.
    ///
    /// Several movements for the same ingredient fold into a single cache
    /// write; the conditional write protocol admits one version step per key
    /// per commit.
    pub async fn apply_batch(
        &self,
        mut txns: Vec<StockTransaction>,
    ) -> AppResult<Vec<StockTransaction>> {
        // same idempotency rule as apply_transaction: entries already in the
        // ledger must not move the cache a second time
        txns.retain(|t| self.store.get_transaction(t.id).is_none());
        if txns.is_empty() {
            return Ok(txns);
        }

        for _attempt in 0..MAX_COMMIT_RETRIES {
            let mut updates: Vec<Ingredient> = Vec::with_capacity(txns.len());
            for txn in &mut txns {
                let current = match updates.iter().find(|i| i.id == txn.ingredient_id) {
                    Some(touched) => touched.clone(),
                    None => {
                        let fresh = self.lookup(txn.ingredient_id).await?;
                        if !fresh.is_active() {
                            return Err(AppError::Validation {
                                field: "ingredient_id".to_string(),
                                message: format!(
                                    "{} was merged and is no longer selectable",
                                    fresh.name
                                ),
                                message_pt: format!(
                                    "{} foi unificado e não pode mais receber lançamentos",
                                    fresh.name
                                ),
                            });
                        }
                        fresh
                    }
                };
                if txn.reverses.is_none()
                    && !matches!(
                        txn.kind,
                        TransactionKind::Purchase | TransactionKind::MergeAdjustment
                    )
                {
                    txn.unit_cost = current.avg_unit_cost;
                }
                let mut next = next_state(&current, txn)?;
                match updates.iter_mut().find(|i| i.id == next.id) {
                    Some(slot) => {
                        // one cache write per key; keep the version a single
                        // step above the stored one
                        next.version = slot.version;
                        *slot = next;
                    }
                    None => updates.push(next),
                }
            }
            match self.store.commit(updates, txns.clone()) {
                Ok(()) => return Ok(txns),
                Err(StoreError::VersionConflict(_)) => continue,
                Err(e) => return Err(AppError::Internal(e.to_string())),
            }
        }
        Err(AppError::ConcurrencyConflict("ingredient batch".to_string()))
    }

    /// Record a manual correction; the only write allowed to drive stock
    /// negative (to log inventory that was never entered)
    pub async fn record_correction(
        &self,
        ingredient_id: Uuid,
        input: CorrectionInput,
    ) -> AppResult<Ingredient> {
        if input.quantity_delta == Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity_delta".to_string(),
                message: "Correction delta cannot be zero".to_string(),
                message_pt: "O ajuste não pode ser zero".to_string(),
            });
        }
        let mut txn = StockTransaction::new(
            TransactionKind::ManualCorrection,
            ingredient_id,
            input.quantity_delta,
        );
        if let Some(note) = input.note {
            txn = txn.with_note(note);
        }
        self.apply_transaction(txn).await
    }
}
