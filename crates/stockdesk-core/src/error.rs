//! # Error Types
//!
//! Domain-specific error types for stockdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockdesk-core errors (this file)                                     │
//! │  ├── CartError          - A cart mutation was refused                  │
//! │  │   └── StockRejection - Stock guard signal (out of / limited stock)  │
//! │  ├── PreconditionError  - A submission was refused before any I/O      │
//! │  ├── StateError         - Action not allowed in the current state      │
//! │  └── ValidationError    - Input validation failures                    │
//! │                                                                         │
//! │  stockdesk-client errors (separate crate)                              │
//! │  └── ClientError        - Transport, decoding, config + the above      │
//! │                                                                         │
//! │  None of these are thrown for server rejections: those arrive as a     │
//! │  `Rejection` value and drive the submission state machine.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::{CustomerId, ProductId};

// =============================================================================
// Stock Rejection
// =============================================================================

/// Signal from the stock guard. Shown to the user, never a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockRejection {
    /// The product had no stock at all when last fetched.
    #[error("{product} is out of stock")]
    OutOfStock { product: String },

    /// The requested quantity exceeds the last-known stock.
    ///
    /// ```text
    /// Cart qty: 3, available: 3
    ///      │
    ///      ▼
    /// set_line_quantity(P1, 4)
    ///      │
    ///      ▼
    /// Limited { available: 3, requested: 4 }  → "Only 3 RICE-5KG in stock"
    /// ```
    #[error("Only {available} of {product} in stock, requested {requested}")]
    Limited {
        product: String,
        available: i64,
        requested: u32,
    },
}

// =============================================================================
// Cart Error
// =============================================================================

/// Reasons a cart mutation is refused. The cart is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error(transparent)]
    Stock(#[from] StockRejection),

    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    #[error("Cart cannot have more than {max} lines")]
    TooManyLines { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u64, max: u32 },

    /// A submission is in flight or awaiting an override decision.
    #[error("Cart is locked while a sale is being submitted")]
    Locked,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Precondition Error
// =============================================================================

/// Local reasons a sale cannot be submitted. Checked before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Choose a payment method")]
    NoPaymentMethod,

    #[error("Credit sales require a customer")]
    CreditWithoutCustomer,

    #[error("Credit details for customer {0} have not been loaded")]
    CreditViewMissing(CustomerId),

    #[error("Credit details belong to customer {actual}, expected {expected}")]
    CreditViewMismatch {
        expected: CustomerId,
        actual: CustomerId,
    },

    #[error("Customer {customer} has {available} credit available, sale needs {requested}")]
    CreditLimitExceeded {
        customer: CustomerId,
        requested: Money,
        available: Money,
    },

    #[error("Upfront payment {upfront} exceeds sale total {total}")]
    UpfrontExceedsTotal { upfront: Money, total: Money },

    #[error("Cannot submit while {state}")]
    NotIdle { state: &'static str },
}

// =============================================================================
// State Error
// =============================================================================

/// An action was requested that the submission state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot {action} while {state}")]
pub struct StateError {
    pub action: &'static str,
    pub state: &'static str,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Unit Tests
// =============================================================================
