//! # Stock Guard
//!
//! Fast client-side check of a requested quantity against the last-fetched
//! stock figure.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The guard is OPTIMISTIC. Other registers can sell the same units      │
//! │  without this session knowing, so the Sales Service re-checks at       │
//! │  submit time and its rejection is just as expected as ours.            │
//! │                                                                         │
//! │   add_line(P, 1)  ──► check_available ──► check_quantity ──► commit    │
//! │   set_line_qty(P,n) ─────────────────────► check_quantity ──► commit    │
//! │                                                                         │
//! │  Every check runs BEFORE the cart is touched, so the cart never holds  │
//! │  an over-quantity line, not even transiently.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::StockRejection;

/// First-add check: a product with no stock is refused before any quantity
/// math happens.
pub fn check_available(product: &str, available: i64) -> Result<(), StockRejection> {
    if available <= 0 {
        return Err(StockRejection::OutOfStock {
            product: product.to_string(),
        });
    }
    Ok(())
}

/// Refuses `requested` units when more than `available` are known to exist.
pub fn check_quantity(product: &str, available: i64, requested: u32) -> Result<(), StockRejection> {
    if i64::from(requested) <= available {
        return Ok(());
    }

    if available <= 0 {
        return Err(StockRejection::OutOfStock {
            product: product.to_string(),
        });
    }

    Err(StockRejection::Limited {
        product: product.to_string(),
        available,
        requested,
    })
}
