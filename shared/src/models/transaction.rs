//! Stock-movement transactions
//!
//! Transactions are immutable once appended to the ledger. Corrections are
//! new transactions, never edits or deletes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Stock entering via a purchase; carries the purchase unit cost and is
    /// the only kind that moves the weighted-average cost
    Purchase,
    /// Proportional ingredient consumption produced by a product sale
    SaleConsumption,
    /// Loss event
    Waste,
    /// Marker appended on the target of an ingredient merge; its unit cost
    /// checkpoints the combined weighted-average cost
    MergeAdjustment,
    /// Operator correction, allowed to drive stock negative to record
    /// previously unlogged inventory
    ManualCorrection,
}

/// Reference to the business event a transaction belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum EventRef {
    Sale(Uuid),
    Waste(Uuid),
}

/// A single ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTransaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub ingredient_id: Uuid,
    /// Signed delta in the ingredient's base unit: positive for purchases
    /// and stock-increasing corrections, negative for consumption and waste
    pub quantity_delta: Decimal,
    /// Unit cost at the time of the transaction: the purchase price for
    /// purchases, the then-current weighted average for consumption and waste
    pub unit_cost: Decimal,
    /// Correction flag; transactions marked as corrections bypass the
    /// non-negative stock guard
    #[serde(default)]
    pub correction: bool,
    /// Sale or waste event that produced this transaction
    pub parent_event: Option<EventRef>,
    /// Transaction this one exactly reverses
    pub reverses: Option<Uuid>,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl StockTransaction {
    pub fn new(kind: TransactionKind, ingredient_id: Uuid, quantity_delta: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            ingredient_id,
            quantity_delta,
            unit_cost: Decimal::ZERO,
            correction: matches!(kind, TransactionKind::ManualCorrection),
            parent_event: None,
            reverses: None,
            note: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_unit_cost(mut self, unit_cost: Decimal) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    pub fn with_parent(mut self, parent: EventRef) -> Self {
        self.parent_event = Some(parent);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Whether the non-negative stock guard is waived for this transaction
    pub fn is_correction(&self) -> bool {
        self.correction
    }

    /// Build the exact inverse of this transaction: same kind and unit cost,
    /// negated delta, pointing back at the original. The original is never
    /// touched.
    pub fn reversal(&self) -> StockTransaction {
        StockTransaction {
            id: Uuid::new_v4(),
            kind: self.kind,
            ingredient_id: self.ingredient_id,
            quantity_delta: -self.quantity_delta,
            unit_cost: self.unit_cost,
            correction: self.correction,
            parent_event: self.parent_event,
            reverses: Some(self.id),
            note: None,
            recorded_at: Utc::now(),
        }
    }
}
