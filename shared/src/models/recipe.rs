//! Recipe models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingredient line of a recipe, quantity in the ingredient's base unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeEntry {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
}

/// A non-stockable cost attached to a recipe (packaging, gas, delivery...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtraCost {
    pub name: String,
    pub amount: Decimal,
}

/// Which pricing field the caller supplied last.
///
/// Exactly one of margin or price is authoritative at any computation; the
/// other is always re-derived from it and the unit cost, never edited
/// independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PricingInput {
    Margin,
    Price,
}

/// A recipe: ingredient lines, extra costs and its pricing state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub name: String,
    pub entries: Vec<RecipeEntry>,
    pub extra_costs: Vec<ExtraCost>,
    /// Unit cost derived from registry costs at the last pricing computation
    pub unit_cost: Decimal,
    pub margin_percent: Decimal,
    pub sale_price: Decimal,
    pub pricing_input: PricingInput,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
