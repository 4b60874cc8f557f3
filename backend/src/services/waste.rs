//! Waste registration and reversal
//!
//! Losses are first-class events: they deduct stock through regular ledger
//! transactions and carry the economics of the loss. Raw-ingredient waste
//! costs what the stock was worth; finished-product waste additionally
//! carries the revenue foregone at the catalog price.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    normalize_raw, validate_quantity, EventRef, StockTransaction, TransactionKind, WasteEvent,
    WasteReason, WasteTarget,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

use super::registry::IngredientService;

/// Input for registering an ingredient loss
#[derive(Debug, Deserialize)]
pub struct IngredientWasteInput {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    /// Any supported unit of the ingredient's category
    pub unit: String,
    pub reason: WasteReason,
    pub note: Option<String>,
}

/// Input for registering a finished-product loss
#[derive(Debug, Deserialize)]
pub struct ProductWasteInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub reason: WasteReason,
    pub note: Option<String>,
}

/// Waste service
#[derive(Clone)]
pub struct WasteService {
    store: Arc<dyn Store>,
    registry: IngredientService,
}

impl WasteService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            registry: IngredientService::new(store.clone()),
            store,
        }
    }

    /// Register a raw-ingredient loss. The financial loss is the wasted
    /// quantity at the weighted-average cost in effect at commit time.
    pub async fn register_ingredient_waste(
        &self,
        input: IngredientWasteInput,
    ) -> AppResult<WasteEvent> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_pt: "A quantidade desperdiçada deve ser positiva".to_string(),
        })?;
        let ingredient = self.registry.resolve_canonical(input.ingredient_id).await?;
        let quantity = normalize_raw(input.quantity, &input.unit, ingredient.category)?;

        let event_id = Uuid::new_v4();
        let mut txn = StockTransaction::new(TransactionKind::Waste, ingredient.id, -quantity)
            .with_parent(EventRef::Waste(event_id));
        if let Some(note) = &input.note {
            txn = txn.with_note(note.clone());
        }
        let committed = self.registry.apply_batch(vec![txn]).await?;
        let financial_loss = committed
            .iter()
            .map(|t| -t.quantity_delta * t.unit_cost)
            .sum();

        let event = WasteEvent {
            id: event_id,
            target: WasteTarget::Ingredient(ingredient.id),
            quantity,
            reason: input.reason,
            financial_loss,
            opportunity_loss: Decimal::ZERO,
            txns: committed.iter().map(|t| t.id).collect(),
            reversed: false,
            recorded_at: Utc::now(),
        };
        self.store.put_waste_event(event.clone());
        tracing::info!(
            event = %event.id,
            ingredient = %ingredient.name,
            reason = ?event.reason,
            loss = %event.financial_loss,
            "ingredient waste registered"
        );
        Ok(event)
    }

    /// Register a finished-product loss: consumes the product's frozen
    /// ingredient lines proportionally, like a sale that earned nothing.
    /// Opportunity loss is the quantity at the catalog price.
    pub async fn register_product_waste(
        &self,
        input: ProductWasteInput,
    ) -> AppResult<WasteEvent> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_pt: "A quantidade desperdiçada deve ser positiva".to_string(),
        })?;
        let product = self
            .store
            .get_product(input.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let event_id = Uuid::new_v4();
        let mut txns = Vec::with_capacity(product.entries.len());
        for entry in &product.entries {
            let ingredient = self.registry.resolve_canonical(entry.ingredient_id).await?;
            let mut txn = StockTransaction::new(
                TransactionKind::Waste,
                ingredient.id,
                -(entry.quantity * input.quantity),
            )
            .with_parent(EventRef::Waste(event_id));
            if let Some(note) = &input.note {
                txn = txn.with_note(note.clone());
            }
            txns.push(txn);
        }
        let committed = self.registry.apply_batch(txns).await?;
        let financial_loss = committed
            .iter()
            .map(|t| -t.quantity_delta * t.unit_cost)
            .sum();

        let event = WasteEvent {
            id: event_id,
            target: WasteTarget::Product(product.id),
            quantity: input.quantity,
            reason: input.reason,
            financial_loss,
            opportunity_loss: input.quantity * product.sale_price,
            txns: committed.iter().map(|t| t.id).collect(),
            reversed: false,
            recorded_at: Utc::now(),
        };
        self.store.put_waste_event(event.clone());
        tracing::info!(
            event = %event.id,
            product = %product.name,
            reason = ?event.reason,
            loss = %event.financial_loss,
            "product waste registered"
        );
        Ok(event)
    }

    /// Reverse a waste event by appending the exact inverse of each of its
    /// ledger transactions
    pub async fn reverse_waste(&self, event_id: Uuid) -> AppResult<WasteEvent> {
        self.store
            .get_waste_event(event_id)
            .ok_or(AppError::WasteEventNotFound(event_id))?;
        // atomic claim on the flag; of two concurrent reversals exactly one
        // gets past this line
        let event = self
            .store
            .set_waste_reversed(event_id, true)
            .ok_or(AppError::AlreadyReversed(event_id))?;

        let mut reversals = Vec::with_capacity(event.txns.len());
        for txn_id in &event.txns {
            match self.store.get_transaction(*txn_id) {
                Some(original) => reversals.push(original.reversal()),
                None => {
                    self.store.set_waste_reversed(event_id, false);
                    return Err(AppError::Internal(format!(
                        "missing ledger entry {}",
                        txn_id
                    )));
                }
            }
        }
        if let Err(e) = self.registry.apply_batch(reversals).await {
            // release the claim so the reversal can be retried
            self.store.set_waste_reversed(event_id, false);
            return Err(e);
        }
        tracing::info!(event = %event.id, "waste event reversed");
        Ok(event)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<WasteEvent> {
        self.store
            .get_waste_event(id)
            .ok_or(AppError::WasteEventNotFound(id))
    }

    /// All waste events, newest first
    pub async fn list(&self) -> Vec<WasteEvent> {
        let mut events = self.store.list_waste_events();
        events.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        events
    }
}
