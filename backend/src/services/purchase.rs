//! Purchase intake
//!
//! Manual purchase entry plus the receipt flow: extract line items from a
//! photo, resolve each raw name against the registry, and record what can be
//! recorded without asking. Lines that need a human decision come back as
//! pending, never silently guessed into the ledger.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    normalize_name, normalize_raw, parse_unit, validate_cost, validate_quantity, ExtractedLine,
    ExtractedReceipt, Ingredient, StockTransaction, TransactionKind, UnitCategory,
};
use uuid::Uuid;

use crate::config::MatchingConfig;
use crate::error::{AppError, AppResult};
use crate::external::{MatchOutcome, NameMatcher, ReceiptExtractor};
use crate::store::Store;

use super::registry::IngredientService;

/// Confidence thresholds driving the receipt flow
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    /// At or above: unify with the matched ingredient without asking
    pub auto_unify_threshold: f32,
    /// At or above (but below auto): surface the match for confirmation.
    /// Below: propose creating a new ingredient.
    pub confirm_threshold: f32,
}

impl From<&MatchingConfig> for MatchPolicy {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            auto_unify_threshold: config.auto_unify_threshold,
            confirm_threshold: config.confirm_threshold,
        }
    }
}

/// Input for a manual purchase entry
#[derive(Debug, Deserialize)]
pub struct PurchaseInput {
    pub ingredient_id: Uuid,
    /// Quantity in any supported unit of the ingredient's category
    pub quantity: Decimal,
    pub unit: String,
    /// Price per submitted unit, not per base unit
    pub unit_price: Decimal,
    pub note: Option<String>,
}

/// A receipt line recorded into the ledger
#[derive(Debug, Clone, Serialize)]
pub struct RecordedPurchase {
    pub line: ExtractedLine,
    pub ingredient: Ingredient,
    pub transaction_id: Uuid,
}

/// How a pending line should be resolved
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum PendingResolution {
    /// A probable match needing operator confirmation
    Confirm {
        ingredient_id: Uuid,
        ingredient_name: String,
        confidence: f32,
    },
    /// No credible match; propose a new registry entry
    CreateNew {
        suggested_name: String,
        category: UnitCategory,
    },
}

/// A receipt line awaiting an operator decision
#[derive(Debug, Clone, Serialize)]
pub struct PendingLine {
    pub line: ExtractedLine,
    pub resolution: PendingResolution,
}

/// Outcome of processing a receipt
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOutcome {
    pub store: Option<String>,
    pub recorded: Vec<RecordedPurchase>,
    pub pending: Vec<PendingLine>,
}

/// Purchase intake service
#[derive(Clone)]
pub struct PurchaseService {
    store: Arc<dyn Store>,
    registry: IngredientService,
    extractor: Arc<dyn ReceiptExtractor>,
    matcher: Arc<dyn NameMatcher>,
    policy: MatchPolicy,
}

impl PurchaseService {
    pub fn new(
        store: Arc<dyn Store>,
        extractor: Arc<dyn ReceiptExtractor>,
        matcher: Arc<dyn NameMatcher>,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            registry: IngredientService::new(store.clone()),
            store,
            extractor,
            matcher,
            policy,
        }
    }

    /// Record a manual purchase: normalize the quantity into base units and
    /// append a purchase transaction carrying the per-base-unit cost.
    pub async fn record_purchase(&self, input: PurchaseInput) -> AppResult<StockTransaction> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_pt: "A quantidade comprada deve ser positiva".to_string(),
        })?;
        validate_cost(input.unit_price).map_err(|msg| AppError::Validation {
            field: "unit_price".to_string(),
            message: msg.to_string(),
            message_pt: "O preço unitário não pode ser negativo".to_string(),
        })?;
        let ingredient = self.registry.resolve_canonical(input.ingredient_id).await?;
        let quantity = normalize_raw(input.quantity, &input.unit, ingredient.category)?;
        // price per base unit, so the weighted average stays unit-consistent
        let unit_cost = (input.quantity * input.unit_price) / quantity;

        let mut txn = StockTransaction::new(TransactionKind::Purchase, ingredient.id, quantity)
            .with_unit_cost(unit_cost);
        if let Some(note) = input.note {
            txn = txn.with_note(note);
        }
        let txn_id = txn.id;
        self.registry.apply_transaction(txn).await?;
        self.store
            .get_transaction(txn_id)
            .ok_or_else(|| AppError::Internal(format!("missing ledger entry {}", txn_id)))
    }

    /// Extract structured line items from a receipt photo
    pub async fn extract_receipt(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> AppResult<ExtractedReceipt> {
        let receipt = self.extractor.extract(image, mime_type).await?;
        if receipt.lines.is_empty() {
            return Err(AppError::ExtractionError(
                "no purchase lines found on the receipt".to_string(),
            ));
        }
        Ok(receipt)
    }

    /// Resolve and record the lines of an extracted receipt.
    ///
    /// Exact normalized-name hits and high-confidence matches are recorded
    /// immediately; everything else comes back pending. A line whose unit
    /// the normalizer rejects is pended as a new-ingredient proposal rather
    /// than failing the whole receipt.
    pub async fn process_receipt(&self, receipt: ExtractedReceipt) -> AppResult<PurchaseOutcome> {
        let mut recorded = Vec::new();
        let mut pending = Vec::new();

        for line in receipt.lines {
            let name = normalize_name(&line.raw_name);
            let unit = match parse_unit(&line.unit) {
                Ok(unit) => unit,
                Err(_) => {
                    tracing::warn!(line = %line.raw_name, unit = %line.unit, "unsupported receipt unit");
                    pending.push(PendingLine {
                        resolution: PendingResolution::CreateNew {
                            suggested_name: name,
                            category: UnitCategory::Count,
                        },
                        line,
                    });
                    continue;
                }
            };

            let exact = self
                .store
                .find_ingredient_by_name(&name)
                .filter(|i| i.is_active());
            if let Some(ingredient) = exact {
                recorded.push(self.record_line(&line, ingredient.id).await?);
                continue;
            }

            let candidates: Vec<Ingredient> = self
                .registry
                .list_active()
                .await
                .into_iter()
                .filter(|i| i.category == unit.category())
                .collect();
            match self.matcher.best_match(&name, &candidates).await? {
                MatchOutcome::Match {
                    ingredient_id,
                    confidence,
                } if confidence >= self.policy.auto_unify_threshold => {
                    tracing::info!(line = %line.raw_name, confidence, "auto-unified receipt line");
                    recorded.push(self.record_line(&line, ingredient_id).await?);
                }
                MatchOutcome::Match {
                    ingredient_id,
                    confidence,
                } if confidence >= self.policy.confirm_threshold => {
                    let ingredient = self.registry.lookup(ingredient_id).await?;
                    pending.push(PendingLine {
                        line,
                        resolution: PendingResolution::Confirm {
                            ingredient_id,
                            ingredient_name: ingredient.name,
                            confidence,
                        },
                    });
                }
                _ => pending.push(PendingLine {
                    resolution: PendingResolution::CreateNew {
                        suggested_name: name,
                        category: unit.category(),
                    },
                    line,
                }),
            }
        }

        Ok(PurchaseOutcome {
            store: receipt.store,
            recorded,
            pending,
        })
    }

    /// Record a pending line against the ingredient the operator chose
    pub async fn confirm_line(
        &self,
        line: ExtractedLine,
        ingredient_id: Uuid,
    ) -> AppResult<RecordedPurchase> {
        self.record_line(&line, ingredient_id).await
    }

    async fn record_line(
        &self,
        line: &ExtractedLine,
        ingredient_id: Uuid,
    ) -> AppResult<RecordedPurchase> {
        let txn = self
            .record_purchase(PurchaseInput {
                ingredient_id,
                quantity: line.quantity,
                unit: line.unit.clone(),
                unit_price: line.unit_price,
                note: Some(format!("receipt: {}", line.raw_name)),
            })
            .await?;
        let ingredient = self.registry.lookup(txn.ingredient_id).await?;
        Ok(RecordedPurchase {
            line: line.clone(),
            ingredient,
            transaction_id: txn.id,
        })
    }
}
