//! Validation utilities for the Divino Alimento marketplace
//!
//! The engine itself clamps instead of rejecting. These checks guard data at
//! the edges: offers coming from suppliers, market settings, configuration.

use rust_decimal::Decimal;

use crate::models::{LeftoverRow, Offer, SaleType};

// ============================================================================
// Offer Validations
// ============================================================================

/// Validate an offer before it is listed in a cycle
pub fn validate_offer(offer: &Offer) -> Result<(), &'static str> {
    if offer.id.trim().is_empty() {
        return Err("Offer id is required");
    }
    if offer.group_key().is_none() {
        return Err("Base product name is required");
    }
    if offer.unit.trim().is_empty() {
        return Err("Unit is required");
    }
    if offer.supplier_name.trim().is_empty() {
        return Err("Supplier name is required");
    }
    validate_unit_price(offer.unit_price)
}

/// Validate a unit price (free items are allowed, negative prices are not)
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    if price.scale() > 2 && price != price.round_dp(2) {
        return Err("Unit price must have at most 2 decimal places");
    }
    Ok(())
}

/// Validate a leftover row read from a source cycle
pub fn validate_leftover_row(row: &LeftoverRow) -> Result<(), &'static str> {
    if row.product_name.trim().is_empty() {
        return Err("Product name is required");
    }
    if row.unit.trim().is_empty() {
        return Err("Unit is required");
    }
    Ok(())
}

// ============================================================================
// Market and Configuration Validations
// ============================================================================

/// Validate a market's basket cap (valorMaximoCesta)
pub fn validate_basket_cap(cap: Decimal) -> Result<(), &'static str> {
    if cap <= Decimal::ZERO {
        return Err("Basket cap must be positive");
    }
    Ok(())
}

/// Validate the assumed order ratio used when order data is missing
pub fn validate_order_ratio(ratio: Decimal) -> Result<(), &'static str> {
    if ratio < Decimal::ZERO || ratio > Decimal::ONE {
        return Err("Order ratio must be between 0 and 1");
    }
    Ok(())
}

/// Split a draft storage key into (sale type, cycle id, market id)
///
/// Format: `composicao-<slug>-ciclo-<cycle>-mercado-<market>`
pub fn parse_composition_storage_key(key: &str) -> Result<(SaleType, String, String), &'static str> {
    let rest = key
        .strip_prefix("composicao-")
        .ok_or("Storage key must start with 'composicao-'")?;
    let (slug, rest) = rest
        .split_once("-ciclo-")
        .ok_or("Storage key is missing the cycle segment")?;
    let (cycle_id, market_id) = rest
        .rsplit_once("-mercado-")
        .ok_or("Storage key is missing the market segment")?;

    let sale_type = SaleType::parse(slug).ok_or("Unknown sale type in storage key")?;
    if cycle_id.is_empty() || market_id.is_empty() {
        return Err("Storage key has an empty id");
    }
    Ok((sale_type, cycle_id.to_string(), market_id.to_string()))
}
