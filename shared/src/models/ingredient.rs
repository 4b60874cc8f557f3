//! Ingredient catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UnitCategory;

/// A canonical ingredient.
///
/// `quantity` and `avg_unit_cost` are cached reductions of the ledger, not
/// independent sources of truth; replaying the ledger must reproduce them
/// exactly. `version` guards optimistic-concurrency writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    /// Display name, stored trimmed and uppercased
    pub name: String,
    pub category: UnitCategory,
    /// Current stock in the category's base unit
    pub quantity: Decimal,
    /// Current weighted-average cost per base unit
    pub avg_unit_cost: Decimal,
    /// Optimistic-concurrency version, bumped on every committed write
    pub version: u64,
    /// Set when this ingredient was merged into another; it then stops being
    /// selectable for new entries but stays resolvable for historical audit
    pub merged_into: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    pub fn new(name: String, category: UnitCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            category,
            quantity: Decimal::ZERO,
            avg_unit_cost: Decimal::ZERO,
            version: 0,
            merged_into: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Selectable for new purchases, recipes and waste entries
    pub fn is_active(&self) -> bool {
        self.merged_into.is_none()
    }

    /// Value of the stock on hand at the current average cost
    pub fn stock_value(&self) -> Decimal {
        self.quantity * self.avg_unit_cost
    }
}
