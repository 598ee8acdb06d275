//! # Order Files
//!
//! A sale described in TOML, fed to the desk line by line.
//!
//! ```toml
//! payment = "credit"
//! customer = "c-1"
//! upfront = "20.00"
//! discount = { percent = "5" }
//!
//! [[items]]
//! product_id = "42"
//! quantity = 2
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use stockdesk_core::{CustomerId, Money, PaymentClassification, ProductId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Failed to read order file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid order file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Order has no items")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Either a fixed amount or a percentage of the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDiscount {
    Amount(Money),
    Percent(Decimal),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderFile {
    pub items: Vec<OrderItem>,
    pub payment: PaymentClassification,
    #[serde(default)]
    pub discount: Option<OrderDiscount>,
    #[serde(default)]
    pub customer: Option<CustomerId>,
    #[serde(default)]
    pub upfront: Option<Money>,
}

impl OrderFile {
    pub fn load(path: &Path) -> Result<Self, OrderError> {
        let contents = std::fs::read_to_string(path).map_err(|source| OrderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }
}

impl std::str::FromStr for OrderFile {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let order: OrderFile = toml::from_str(s)?;
        if order.items.is_empty() {
            return Err(OrderError::Empty);
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_credit_order() {
        let order: OrderFile = r#"
            payment = "credit"
            customer = "c-1"
            upfront = "20.00"
            discount = { percent = "5" }

            [[items]]
            product_id = "42"
            quantity = 2

            [[items]]
            product_id = 43
        "#
        .parse()
        .unwrap();

        assert_eq!(order.payment, PaymentClassification::Credit);
        assert_eq!(order.customer, Some(CustomerId::new("c-1")));
        assert_eq!(order.upfront, Some(Money::new(dec!(20))));
        assert_eq!(order.discount, Some(OrderDiscount::Percent(dec!(5))));
        assert_eq!(order.items[1].product_id, ProductId::new("43"));
        assert_eq!(order.items[1].quantity, 1);
    }

    #[test]
    fn test_amount_discount() {
        let order: OrderFile = r#"
            payment = "cash"
            discount = { amount = "10" }
            items = [{ product_id = "1", quantity = 3 }]
        "#
        .parse()
        .unwrap();
        assert_eq!(order.discount, Some(OrderDiscount::Amount(Money::new(dec!(10)))));
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = "payment = \"cash\"\nitems = []".parse::<OrderFile>().unwrap_err();
        assert!(matches!(err, OrderError::Empty));
    }

    #[test]
    fn test_unknown_payment_rejected() {
        let err = "payment = \"barter\"\nitems = [{ product_id = \"1\" }]"
            .parse::<OrderFile>()
            .unwrap_err();
        assert!(matches!(err, OrderError::Parse(_)));
    }
}
