//! # Validation Module
//!
//! Input validation for values typed at the sale desk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (client, before the cart mutates)                │
//! │  ├── Quantities, prices, identifiers                                   │
//! │  └── Immediate feedback, no network                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart + Stock Guard (client, optimistic)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Sales Service (server, authoritative)                        │
//! │  ├── Stock availability at commit time                                 │
//! │  ├── Credit limits                                                     │
//! │  └── Price outlier detection                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product identifier (non-empty, at most 64 characters).
///
/// ```rust
/// use stockdesk_core::validation::validate_product_id;
///
/// assert!(validate_product_id("42").is_ok());
/// assert!(validate_product_id("  ").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "product".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "product".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ```text
/// User enters quantity: 5
///      │
///      ▼
/// validate_quantity(5) ← THIS FUNCTION
///      │
///      ├── qty == 0? → "quantity must be positive"
///      ├── qty > 999? → "quantity must be between 1 and 999"
///      └── OK → stock guard
/// ```
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items); negative is not.
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit price".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount paid up front on a credit sale.
pub fn validate_upfront_payment(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "upfront payment".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("42").is_ok());
        assert!(validate_product_id("prod_8f3a").is_ok());

        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
        assert!(validate_product_id(&"9".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(Money::from_cents(1099)).is_ok());
        assert!(validate_unit_price(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_upfront_payment() {
        assert!(validate_upfront_payment(Money::zero()).is_ok());
        assert!(validate_upfront_payment(Money::from_cents(-500)).is_err());
    }
}
