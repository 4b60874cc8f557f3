//! Waste event models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What was lost: raw ingredient stock or a finished product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum WasteTarget {
    Ingredient(Uuid),
    Product(Uuid),
}

/// Why it was lost
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WasteReason {
    /// Past its date
    Expiration,
    /// Storage failure: temperature, humidity, packaging, pests
    Storage,
    /// Kitchen error: portioning, recipe, overcooking, contamination
    PreparationError,
    /// Dropped or damaged in handling
    Drop,
    /// Buffet or service leftovers, customer returns
    ServiceLeftover,
    Other,
}

impl WasteReason {
    pub const ALL: [WasteReason; 6] = [
        WasteReason::Expiration,
        WasteReason::Storage,
        WasteReason::PreparationError,
        WasteReason::Drop,
        WasteReason::ServiceLeftover,
        WasteReason::Other,
    ];
}

/// A registered loss event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteEvent {
    pub id: Uuid,
    pub target: WasteTarget,
    pub quantity: Decimal,
    pub reason: WasteReason,
    /// Cost of the lost stock at the average cost in effect
    pub financial_loss: Decimal,
    /// Revenue foregone when the target is a finished product (quantity x
    /// catalog price); zero for raw ingredients
    pub opportunity_loss: Decimal,
    /// Waste transactions this event appended to the ledger
    pub txns: Vec<Uuid>,
    pub reversed: bool,
    pub recorded_at: DateTime<Utc>,
}
