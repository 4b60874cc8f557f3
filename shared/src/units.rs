//! Unit normalization
//!
//! Converts heterogeneous purchase units into the canonical base unit of an
//! ingredient's category (mass -> grams, volume -> milliliters, count ->
//! units). Pure functions with a fixed conversion table; no side effects.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::UnitCategory;

/// Units a purchase or recipe entry may be expressed in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseUnit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    /// Kitchen cup, 240 ml
    Cup,
    /// Tablespoon, 15 ml
    Tablespoon,
    Unit,
    Dozen,
}

impl PurchaseUnit {
    /// The category this unit belongs to
    pub fn category(&self) -> UnitCategory {
        match self {
            PurchaseUnit::Gram | PurchaseUnit::Kilogram => UnitCategory::Mass,
            PurchaseUnit::Milliliter
            | PurchaseUnit::Liter
            | PurchaseUnit::Cup
            | PurchaseUnit::Tablespoon => UnitCategory::Volume,
            PurchaseUnit::Unit | PurchaseUnit::Dozen => UnitCategory::Count,
        }
    }

    /// Multiplier into the category's base unit
    pub fn base_factor(&self) -> Decimal {
        match self {
            PurchaseUnit::Gram | PurchaseUnit::Milliliter | PurchaseUnit::Unit => Decimal::ONE,
            PurchaseUnit::Kilogram | PurchaseUnit::Liter => Decimal::from(1000),
            PurchaseUnit::Cup => Decimal::from(240),
            PurchaseUnit::Tablespoon => Decimal::from(15),
            PurchaseUnit::Dozen => Decimal::from(12),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            PurchaseUnit::Gram => "g",
            PurchaseUnit::Kilogram => "kg",
            PurchaseUnit::Milliliter => "ml",
            PurchaseUnit::Liter => "l",
            PurchaseUnit::Cup => "cup",
            PurchaseUnit::Tablespoon => "tbsp",
            PurchaseUnit::Unit => "un",
            PurchaseUnit::Dozen => "dz",
        }
    }
}

/// Normalization failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("unsupported unit: {0}")]
    UnsupportedUnit(String),

    #[error("unit {unit} cannot convert into a {expected:?} quantity")]
    CategoryMismatch {
        unit: &'static str,
        expected: UnitCategory,
    },
}

/// Parse a unit symbol as it appears on receipts or extractor output.
///
/// Accepts the symbols produced by [`PurchaseUnit::symbol`] plus the common
/// uppercase spellings found on Brazilian receipts ("UN", "KG", "L", ...).
pub fn parse_unit(raw: &str) -> Result<PurchaseUnit, UnitError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "g" | "gr" | "grama" | "gramas" => Ok(PurchaseUnit::Gram),
        "kg" | "kilo" | "quilo" => Ok(PurchaseUnit::Kilogram),
        "ml" => Ok(PurchaseUnit::Milliliter),
        "l" | "lt" | "litro" | "litros" => Ok(PurchaseUnit::Liter),
        "cup" | "xicara" | "xícara" => Ok(PurchaseUnit::Cup),
        "tbsp" | "colher" => Ok(PurchaseUnit::Tablespoon),
        "un" | "und" | "unid" | "unidade" | "pc" => Ok(PurchaseUnit::Unit),
        "dz" | "duzia" | "dúzia" => Ok(PurchaseUnit::Dozen),
        other => Err(UnitError::UnsupportedUnit(other.to_string())),
    }
}

/// Convert `quantity` expressed in `unit` into the base unit of `category`.
///
/// Fails with [`UnitError::CategoryMismatch`] when the unit belongs to a
/// different category than the ingredient (e.g. a mass unit supplied for a
/// volume-based ingredient).
pub fn normalize(
    quantity: Decimal,
    unit: PurchaseUnit,
    category: UnitCategory,
) -> Result<Decimal, UnitError> {
    if unit.category() != category {
        return Err(UnitError::CategoryMismatch {
            unit: unit.symbol(),
            expected: category,
        });
    }
    Ok(quantity * unit.base_factor())
}

/// Convert a quantity whose unit arrives as an untrusted string, e.g. from
/// the receipt extractor. Unknown symbols fail with `UnsupportedUnit` before
/// the category is even considered.
pub fn normalize_raw(
    quantity: Decimal,
    raw_unit: &str,
    category: UnitCategory,
) -> Result<Decimal, UnitError> {
    let unit = parse_unit(raw_unit)?;
    normalize(quantity, unit, category)
}
