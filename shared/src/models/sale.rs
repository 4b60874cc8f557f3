//! Sale models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the sale happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    #[default]
    InPerson,
    WhatsApp,
    Instagram,
    Other,
}

/// Optional customer metadata captured with a sale
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub channel: SalesChannel,
}

/// A registered product sale.
///
/// `consumption_txns` links the sale-consumption ledger entries this sale
/// produced, which is what makes exact reversal possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Price actually charged per unit (may differ from the catalog price)
    pub unit_price: Decimal,
    pub total: Decimal,
    pub customer: CustomerInfo,
    pub consumption_txns: Vec<Uuid>,
    pub reversed: bool,
    pub recorded_at: DateTime<Utc>,
}
