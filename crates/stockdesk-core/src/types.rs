//! # Domain Types
//!
//! Types shared by the cart, the submission state machine and the client.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │ ProductSnapshot │   │ CustomerCredit  │   │ PaymentClassification│  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  id (server)    │   │  id (server)    │   │  Cash                │  │
//! │  │  name, sku      │   │  credit_limit   │   │  Transfer            │  │
//! │  │  unit_price     │   │  current_balance│   │  Credit              │  │
//! │  │  available_stock│   └─────────────────┘   └──────────────────────┘  │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  Identifiers are opaque server-assigned keys: the client never parses  │
//! │  or generates them.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        // The backend may send integer primary keys; keep them as opaque text.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum RawId {
                    Text(String),
                    Number(i64),
                }

                Ok(match RawId::deserialize(deserializer)? {
                    RawId::Text(id) => $name(id),
                    RawId::Number(id) => $name(id.to_string()),
                })
            }
        }

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name(id)
            }
        }
    };
}

opaque_id!(
    /// Server-assigned product key.
    ProductId
);
opaque_id!(
    /// Server-assigned customer key.
    CustomerId
);
opaque_id!(
    /// Server-assigned sale key, returned on a successful submission.
    SaleId
);

// =============================================================================
// Product Snapshot
// =============================================================================

/// The catalog view of a product at the moment it was fetched.
///
/// A cart line copies `unit_price` from here when it is first created and
/// never re-reads it, so price edits made elsewhere do not silently change an
/// in-progress sale. `available_stock` is only as fresh as the last fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub unit_price: Money,
    pub available_stock: i64,
    /// Reorder point from the product's restock rule, if one exists.
    #[serde(default)]
    pub reorder_point: Option<i64>,
}

impl ProductSnapshot {
    /// Display label used in stock messages: SKU when present, else name.
    pub fn label(&self) -> &str {
        self.sku.as_deref().unwrap_or(&self.name)
    }

    /// Stock level using the product's reorder point, falling back to
    /// `default_threshold` when it has no restock rule.
    pub fn stock_level(&self, default_threshold: i64) -> StockLevel {
        StockLevel::classify(
            self.available_stock,
            self.reorder_point.unwrap_or(default_threshold),
        )
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Coarse stock status shown next to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    InStock,
}

impl StockLevel {
    /// The single stock classification used across the client.
    ///
    /// - `available <= 0` → `OutOfStock`
    /// - `available <= low_threshold` → `Low`
    /// - otherwise → `InStock`
    pub fn classify(available: i64, low_threshold: i64) -> StockLevel {
        if available <= 0 {
            StockLevel::OutOfStock
        } else if available <= low_threshold {
            StockLevel::Low
        } else {
            StockLevel::InStock
        }
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockLevel::OutOfStock => write!(f, "Out of Stock"),
            StockLevel::Low => write!(f, "Low Stock"),
            StockLevel::InStock => write!(f, "In Stock"),
        }
    }
}

// =============================================================================
// Customer Credit
// =============================================================================

/// Read-only credit view of a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCredit {
    pub id: CustomerId,
    pub name: String,
    pub credit_limit: Money,
    pub current_balance: Money,
}

impl CustomerCredit {
    /// Credit still available: `max(0, limit - balance)`.
    pub fn available_credit(&self) -> Money {
        (self.credit_limit - self.current_balance).max(Money::zero())
    }

    /// True if `amount` more can be put on this customer's account.
    pub fn can_absorb(&self, amount: Money) -> bool {
        amount <= self.available_credit()
    }
}

// =============================================================================
// Payment Classification
// =============================================================================

/// How a sale is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentClassification {
    /// Cash-like: settled in full at the counter.
    Cash,
    /// Transfer-like: bank or mobile transfer, settled in full.
    Transfer,
    /// Put (wholly or partly) on the customer's credit account.
    Credit,
}

impl PaymentClassification {
    /// The backend's `payment_status` for this classification.
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            PaymentClassification::Cash | PaymentClassification::Transfer => PaymentStatus::Paid,
            PaymentClassification::Credit => PaymentStatus::Credit,
        }
    }

    pub fn is_credit(&self) -> bool {
        matches!(self, PaymentClassification::Credit)
    }
}

impl fmt::Display for PaymentClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentClassification::Cash => write!(f, "cash"),
            PaymentClassification::Transfer => write!(f, "transfer"),
            PaymentClassification::Credit => write!(f, "credit"),
        }
    }
}

impl FromStr for PaymentClassification {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentClassification::Cash),
            "transfer" | "bank" | "bank_transfer" | "mobile" | "mobile_money" => {
                Ok(PaymentClassification::Transfer)
            }
            "credit" => Ok(PaymentClassification::Credit),
            _ => Err(ValidationError::NotAllowed {
                field: "payment".to_string(),
                allowed: vec!["cash".into(), "transfer".into(), "credit".into()],
            }),
        }
    }
}

/// Settlement status as the backend records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Credit,
}

// =============================================================================
// Unit Tests
// =============================================================================
