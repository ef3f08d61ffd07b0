//! Validation utilities for the Gôndola platform
//!
//! Field-level checks that the `validator` derives cannot express, shared by
//! the ingestion endpoints and the account endpoints.

use rust_decimal::Decimal;

use crate::models::{ProductInput, SaleInput};

// ============================================================================
// Catalogue & Sales Validations
// ============================================================================

/// Validate that a price is not negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate SKU format (no surrounding or inner whitespace)
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.trim().is_empty() {
        return Err("SKU cannot be empty");
    }
    if sku.chars().any(char::is_whitespace) {
        return Err("SKU cannot contain whitespace");
    }
    Ok(())
}

/// Validate the commercial fields of a product
pub fn validate_product_prices(product: &ProductInput) -> Result<(), (&'static str, &'static str)> {
    validate_price(product.cost_price).map_err(|e| ("cost_price", e))?;
    validate_price(product.sale_price).map_err(|e| ("sale_price", e))?;
    Ok(())
}

/// Validate sale totals and discounts
pub fn validate_sale_amounts(sale: &SaleInput) -> Result<(), (&'static str, &'static str)> {
    validate_price(sale.total).map_err(|e| ("total", e))?;
    for item in &sale.items {
        validate_price(item.unit_price).map_err(|e| ("items.unit_price", e))?;
        validate_price(item.total_price).map_err(|e| ("items.total_price", e))?;
        if let Some(discount) = item.discount {
            validate_price(discount).map_err(|e| ("items.discount", e))?;
        }
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
