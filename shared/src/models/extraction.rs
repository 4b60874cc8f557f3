//! Receipt extraction contract
//!
//! Output shape of the external image-extraction collaborator. The core
//! treats this as untrusted structured input: every line still goes through
//! unit normalization and name resolution before touching the ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One extracted purchase line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedLine {
    /// Name as printed on the receipt, not yet resolved to the catalog
    pub raw_name: String,
    /// Quantity in the raw unit below
    pub quantity: Decimal,
    /// Unit symbol as printed; parsed and validated by the normalizer
    pub unit: String,
    /// Price per raw unit
    pub unit_price: Decimal,
}

/// A structured receipt returned by the extraction collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    pub store: Option<String>,
    pub date: Option<NaiveDate>,
    pub lines: Vec<ExtractedLine>,
}

impl ExtractedLine {
    pub fn total_price(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}
