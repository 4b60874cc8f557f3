//! Costing engine
//!
//! Recipe cost from registry costs plus extra non-stockable costs, and the
//! bidirectional price/margin solver. Whichever of margin or price the
//! caller supplied last is authoritative; the other is always re-derived
//! from it and the cost, never averaged or edited independently.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{ExtraCost, RecipeEntry};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;

use super::registry::IngredientService;

/// Price from cost and margin: `price = cost / (1 - margin/100)`.
///
/// A margin of 100 or more would need division by zero or a negative price,
/// so it fails rather than clamping.
pub fn solve_from_margin(cost: Decimal, margin_percent: Decimal) -> AppResult<Decimal> {
    if margin_percent < Decimal::ZERO || margin_percent >= Decimal::ONE_HUNDRED {
        return Err(AppError::InvalidMargin(margin_percent));
    }
    let fraction = Decimal::ONE - margin_percent / Decimal::ONE_HUNDRED;
    Ok(cost / fraction)
}

/// Margin from cost and price: `margin = (1 - cost/price) * 100`.
///
/// A price at or below zero fails; a price below cost yields a negative
/// margin, which signals a loss-making configuration and must be surfaced to
/// the caller, not suppressed.
pub fn solve_from_price(cost: Decimal, price: Decimal) -> AppResult<Decimal> {
    if price <= Decimal::ZERO {
        return Err(AppError::InvalidPrice(price));
    }
    Ok((Decimal::ONE - cost / price) * Decimal::ONE_HUNDRED)
}

/// One costed ingredient line
#[derive(Debug, Clone, Serialize)]
pub struct CostLine {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub cost: Decimal,
}

/// Full cost breakdown of a recipe
#[derive(Debug, Clone, Serialize)]
pub struct CostBreakdown {
    pub lines: Vec<CostLine>,
    pub extra_costs: Vec<ExtraCost>,
    pub ingredient_cost: Decimal,
    pub extra_cost: Decimal,
    pub total: Decimal,
}

/// Costing service reading current costs from the registry
#[derive(Clone)]
pub struct CostingService {
    registry: IngredientService,
}

impl CostingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            registry: IngredientService::new(store),
        }
    }

    /// Cost a set of recipe entries at current registry prices.
    ///
    /// Entries referencing merged ingredients resolve to their canonical
    /// identity; a dangling reference fails with `UnknownIngredient`.
    pub async fn cost_entries(
        &self,
        entries: &[RecipeEntry],
        extra_costs: &[ExtraCost],
    ) -> AppResult<CostBreakdown> {
        let mut lines = Vec::with_capacity(entries.len());
        let mut ingredient_cost = Decimal::ZERO;
        for entry in entries {
            let ingredient = self.registry.resolve_canonical(entry.ingredient_id).await?;
            let cost = entry.quantity * ingredient.avg_unit_cost;
            ingredient_cost += cost;
            lines.push(CostLine {
                ingredient_id: ingredient.id,
                name: ingredient.name,
                quantity: entry.quantity,
                unit_cost: ingredient.avg_unit_cost,
                cost,
            });
        }
        let extra_cost: Decimal = extra_costs.iter().map(|e| e.amount).sum();
        Ok(CostBreakdown {
            lines,
            extra_costs: extra_costs.to_vec(),
            ingredient_cost,
            extra_cost,
            total: ingredient_cost + extra_cost,
        })
    }
}
