//! Common types used across the platform

use serde::{Deserialize, Serialize};

use crate::units::PurchaseUnit;

/// The canonical base-unit category an ingredient's stock is kept in.
///
/// Every quantity stored for an ingredient is expressed in the category's
/// base unit, regardless of the unit it was purchased in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    /// Stored in grams
    Mass,
    /// Stored in milliliters
    Volume,
    /// Stored in units
    Count,
}

impl UnitCategory {
    /// Symbol of the base unit quantities are stored in
    pub fn base_unit(&self) -> &'static str {
        match self {
            UnitCategory::Mass => "g",
            UnitCategory::Volume => "ml",
            UnitCategory::Count => "un",
        }
    }

    /// The purchase unit that maps 1:1 onto the base unit
    pub fn base_purchase_unit(&self) -> PurchaseUnit {
        match self {
            UnitCategory::Mass => PurchaseUnit::Gram,
            UnitCategory::Volume => PurchaseUnit::Milliliter,
            UnitCategory::Count => PurchaseUnit::Unit,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

/// Date-time range for ledger queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
}

impl TimeRange {
    pub fn contains(&self, at: chrono::DateTime<chrono::Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}
