//! # stockdesk-core: Pure Sale-Entry Logic for StockDesk
//!
//! The cart, its pricing, the stock guard and the submission state machine,
//! as pure functions over plain data. No I/O happens here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StockDesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    stockdesk-cli (terminal)                     │   │
//! │  │    order file ──► cart ──► totals ──► submit ──► override?     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              stockdesk-client (config, HTTP, cache)             │   │
//! │  │    SaleDesk ──► SalesService / CatalogService ──► REST backend  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌────────────┐  ┌──────────┐       │   │
//! │  │   │  money  │  │  cart   │  │ submission │  │  access  │       │   │
//! │  │   │  Money  │  │  Cart   │  │ SaleSession│  │   Role   │       │   │
//! │  │   │ Percent │  │ Discount│  │  Rejection │  │NavSection│       │   │
//! │  │   └─────────┘  └─────────┘  └────────────┘  └──────────┘       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO GLOBALS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal money and percentages, rounded only at the edges
//! - [`types`] - Identifiers, product and customer views, payment classes
//! - [`cart`] - Cart model, pricing calculator and stock guard
//! - [`submission`] - Sale payload, rejection mapping, submission states
//! - [`access`] - Role capability sets for navigation
//! - [`validation`] - Input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal_macros::dec;
//! use stockdesk_core::{Money, PaymentClassification, ProductId, ProductSnapshot, SaleSession};
//!
//! let rice = ProductSnapshot {
//!     id: ProductId::new("42"),
//!     name: "Rice 5kg".to_string(),
//!     sku: None,
//!     unit_price: Money::new(dec!(50)),
//!     available_stock: 8,
//!     reorder_point: None,
//! };
//!
//! let mut session = SaleSession::new();
//! let cart = session.cart_mut().unwrap();
//! cart.add_line(&rice, 2).unwrap();
//! cart.set_discount_amount(Money::new(dec!(10)));
//! cart.choose_payment(PaymentClassification::Cash);
//!
//! let payload = session.begin_submit(None).unwrap();
//! assert_eq!(payload.total_amount, Money::new(dec!(90)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod cart;
pub mod error;
pub mod money;
pub mod submission;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{visible_sections, Capability, NavSection, Role};
pub use cart::{Cart, CartLine, CartTotals, Discount, DiscountSource};
pub use error::{CartError, PreconditionError, StateError, StockRejection, ValidationError};
pub use money::{Money, Percent};
pub use submission::{
    AttemptKind, CacheScope, FailureReason, OutlierWarning, PriceRange, Rejection, SalePayload,
    SalePayloadItem, SaleReceipt, SaleSession, SubmissionOutcome, SubmissionState, Transition,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps sale requests a reasonable size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line
///
/// ## Business Reason
/// Catches slips like typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Low-stock threshold for products without a restock rule.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
