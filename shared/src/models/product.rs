//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RecipeEntry;

/// A sellable product: a frozen snapshot of a recipe at publish time.
///
/// Carries its own identity distinct from the recipe, so later recipe edits
/// do not retroactively alter the recorded economics of past sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub name: String,
    /// Ingredient lines frozen at publish time, base units
    pub entries: Vec<RecipeEntry>,
    /// Unit cost frozen at publish time
    pub unit_cost: Decimal,
    pub margin_percent: Decimal,
    /// Catalog price; also the basis for opportunity loss on product waste
    pub sale_price: Decimal,
    pub published_at: DateTime<Utc>,
}
