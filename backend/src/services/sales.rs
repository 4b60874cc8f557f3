//! Sale registration and reversal
//!
//! A sale consumes its product's frozen ingredient lines proportionally to
//! the quantity sold, in one atomic commit across every touched ingredient.
//! Reversal appends the exact inverse of each consumption transaction; the
//! originals stay in the ledger untouched.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    validate_price, validate_quantity, CustomerInfo, EventRef, RecipeEntry, Sale,
    StockTransaction, TransactionKind,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

use super::registry::IngredientService;

/// Input for registering a sale
#[derive(Debug, Deserialize)]
pub struct SaleInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Price actually charged per unit; defaults to the catalog price
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub customer: CustomerInfo,
}

/// Sale service
#[derive(Clone)]
pub struct SaleService {
    store: Arc<dyn Store>,
    registry: IngredientService,
}

/// Product entries re-resolved to canonical ingredients and combined, so the
/// batch carries one movement per ingredient even when a merge after publish
/// collapsed two frozen lines onto the same identity.
async fn canonical_entries(
    registry: &IngredientService,
    entries: &[RecipeEntry],
) -> AppResult<Vec<RecipeEntry>> {
    let mut combined: Vec<RecipeEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        let ingredient = registry.resolve_canonical(entry.ingredient_id).await?;
        match combined
            .iter_mut()
            .find(|e| e.ingredient_id == ingredient.id)
        {
            Some(existing) => existing.quantity += entry.quantity,
            None => combined.push(RecipeEntry {
                ingredient_id: ingredient.id,
                quantity: entry.quantity,
            }),
        }
    }
    Ok(combined)
}

impl SaleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            registry: IngredientService::new(store.clone()),
            store,
        }
    }

    /// Register a sale, consuming stock for every ingredient of the product
    /// atomically. Insufficient stock of any single ingredient fails the
    /// whole sale with no ledger growth and no partial deduction.
    pub async fn register_sale(&self, input: SaleInput) -> AppResult<Sale> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_pt: "A quantidade vendida deve ser positiva".to_string(),
        })?;
        let product = self
            .store
            .get_product(input.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let unit_price = input.unit_price.unwrap_or(product.sale_price);
        validate_price(unit_price).map_err(|msg| AppError::Validation {
            field: "unit_price".to_string(),
            message: msg.to_string(),
            message_pt: "O preço de venda deve ser positivo".to_string(),
        })?;

        let sale_id = Uuid::new_v4();
        let entries = canonical_entries(&self.registry, &product.entries).await?;
        let txns: Vec<StockTransaction> = entries
            .iter()
            .map(|entry| {
                StockTransaction::new(
                    TransactionKind::SaleConsumption,
                    entry.ingredient_id,
                    -(entry.quantity * input.quantity),
                )
                .with_parent(EventRef::Sale(sale_id))
            })
            .collect();

        let committed = self.registry.apply_batch(txns).await?;

        let sale = Sale {
            id: sale_id,
            product_id: product.id,
            quantity: input.quantity,
            unit_price,
            total: unit_price * input.quantity,
            customer: input.customer,
            consumption_txns: committed.iter().map(|t| t.id).collect(),
            reversed: false,
            recorded_at: Utc::now(),
        };
        self.store.put_sale(sale.clone());
        tracing::info!(
            sale = %sale.id,
            product = %product.name,
            quantity = %sale.quantity,
            total = %sale.total,
            "sale registered"
        );
        Ok(sale)
    }

    /// Reverse a sale by appending the exact inverse of each consumption
    /// transaction. After reversal every touched ingredient's quantity and
    /// average cost are what they were before the sale, and the ledger holds
    /// both the originals and their inverses.
    pub async fn reverse_sale(&self, sale_id: Uuid) -> AppResult<Sale> {
        self.store
            .get_sale(sale_id)
            .ok_or(AppError::SaleNotFound(sale_id))?;
        // atomic claim on the flag; of two concurrent reversals exactly one
        // gets past this line
        let sale = self
            .store
            .set_sale_reversed(sale_id, true)
            .ok_or(AppError::AlreadyReversed(sale_id))?;

        let mut reversals = Vec::with_capacity(sale.consumption_txns.len());
        for txn_id in &sale.consumption_txns {
            match self.store.get_transaction(*txn_id) {
                Some(original) => reversals.push(original.reversal()),
                None => {
                    self.store.set_sale_reversed(sale_id, false);
                    return Err(AppError::Internal(format!(
                        "missing ledger entry {}",
                        txn_id
                    )));
                }
            }
        }
        if let Err(e) = self.registry.apply_batch(reversals).await {
            // release the claim so the reversal can be retried
            self.store.set_sale_reversed(sale_id, false);
            return Err(e);
        }
        tracing::info!(sale = %sale.id, "sale reversed");
        Ok(sale)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Sale> {
        self.store.get_sale(id).ok_or(AppError::SaleNotFound(id))
    }

    /// All sales, newest first
    pub async fn list(&self) -> Vec<Sale> {
        let mut sales = self.store.list_sales();
        sales.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        sales
    }
}
