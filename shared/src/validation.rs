//! Validation utilities for the Costbook ledger
//!
//! Pure checks applied at the write boundary, before anything reaches the
//! ledger.

use rust_decimal::Decimal;

/// Validate a stock or sale quantity is strictly positive
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a unit cost or extra cost is not negative
pub fn validate_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Cost cannot be negative");
    }
    Ok(())
}

/// Validate a margin percentage is in `[0, 100)`.
///
/// A margin of 100 or more would require an infinite or negative price.
pub fn validate_margin(margin_percent: Decimal) -> Result<(), &'static str> {
    if margin_percent < Decimal::ZERO {
        return Err("Margin cannot be negative");
    }
    if margin_percent >= Decimal::ONE_HUNDRED {
        return Err("Margin must be below 100%");
    }
    Ok(())
}

/// Validate a sale price is strictly positive
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Price must be positive");
    }
    Ok(())
}

/// Canonical form for ingredient and product names, matching how the ledger
/// stores them: trimmed, single-spaced, uppercased
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
