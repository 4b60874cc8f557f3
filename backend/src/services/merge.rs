//! Merge coordinator
//!
//! Unifies two ingredient identities into one canonical identity. Historical
//! transactions of the source are rewritten in place to reference the
//! target; the source stays behind as a resolvable alias. Merging is
//! irreversible: the rewrite destroys the information needed to split the
//! histories apart again, so the only way to undo one is a fresh manual
//! correction. This is an accepted limitation, not a bug.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{Ingredient, StockTransaction, TransactionKind};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{Store, StoreError};

use super::MAX_COMMIT_RETRIES;

/// Coordinates ingredient unification
#[derive(Clone)]
pub struct MergeService {
    store: Arc<dyn Store>,
}

/// Outcome of a merge
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub target: Ingredient,
    pub source_id: Uuid,
    /// Historical transactions whose ingredient reference now points at the
    /// target
    pub rewritten_transactions: usize,
}

impl MergeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Merge `source_id` into the canonical `target_id`.
    ///
    /// The target's state becomes the quantity-weighted combination of both
    /// histories at merge time; a zero-delta merge-adjustment marker with
    /// the combined average as its unit cost is appended so a later ledger
    /// replay reproduces the combined state exactly.
    pub async fn merge(&self, source_id: Uuid, target_id: Uuid) -> AppResult<MergeOutcome> {
        if source_id == target_id {
            return Err(AppError::Validation {
                field: "target_id".to_string(),
                message: "Cannot merge an ingredient into itself".to_string(),
                message_pt: "Não é possível unificar um ingrediente com ele mesmo".to_string(),
            });
        }

        for _attempt in 0..MAX_COMMIT_RETRIES {
            let source = self
                .store
                .get_ingredient(source_id)
                .ok_or(AppError::UnknownIngredient(source_id))?;
            let target = self
                .store
                .get_ingredient(target_id)
                .ok_or(AppError::UnknownIngredient(target_id))?;

            if !source.is_active() || !target.is_active() {
                return Err(AppError::Validation {
                    field: "ingredient_id".to_string(),
                    message: "Merged ingredients cannot participate in another merge".to_string(),
                    message_pt: "Ingredientes já unificados não podem ser unificados novamente"
                        .to_string(),
                });
            }
            if source.category != target.category {
                return Err(AppError::IncompatibleUnits {
                    source_category: source.category.base_unit().to_string(),
                    target_category: target.category.base_unit().to_string(),
                });
            }

            let combined_quantity = source.quantity + target.quantity;
            let combined_avg = if combined_quantity > Decimal::ZERO {
                (source.quantity * source.avg_unit_cost + target.quantity * target.avg_unit_cost)
                    / combined_quantity
            } else {
                target.avg_unit_cost
            };

            let now = Utc::now();
            let mut new_target = target.clone();
            new_target.quantity = combined_quantity;
            new_target.avg_unit_cost = combined_avg;
            new_target.version += 1;
            new_target.updated_at = now;

            // The source's ledger becomes empty after the rewrite, so its
            // cache must reduce to zero to keep rebuild == cache.
            let mut new_source = source.clone();
            new_source.quantity = Decimal::ZERO;
            new_source.avg_unit_cost = Decimal::ZERO;
            new_source.merged_into = Some(target_id);
            new_source.version += 1;
            new_source.updated_at = now;

            // Net quantity delta is zero: the rewritten source transactions
            // already carry the quantity into the target's replay. The
            // marker checkpoints the combined average.
            let marker = StockTransaction::new(
                TransactionKind::MergeAdjustment,
                target_id,
                Decimal::ZERO,
            )
            .with_unit_cost(combined_avg)
            .with_note(format!("merged {} into {}", source.name, target.name));

            match self.store.commit_merge(new_source, new_target.clone(), marker) {
                Ok(rewritten) => {
                    tracing::info!(
                        source = %source.name,
                        target = %new_target.name,
                        rewritten,
                        "ingredients merged"
                    );
                    return Ok(MergeOutcome {
                        target: new_target,
                        source_id,
                        rewritten_transactions: rewritten,
                    });
                }
                Err(StoreError::VersionConflict(_)) => continue,
                Err(e) => return Err(AppError::Internal(e.to_string())),
            }
        }
        Err(AppError::ConcurrencyConflict(format!(
            "merge of {} into {}",
            source_id, target_id
        )))
    }
}
