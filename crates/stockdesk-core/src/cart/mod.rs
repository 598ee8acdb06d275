//! # Cart Model
//!
//! The in-progress, unsubmitted sale of one sale-entry session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  User Action              Cart Method              Guard / Recompute    │
//! │  ───────────              ───────────              ─────────────────    │
//! │                                                                         │
//! │  Pick product ──────────► add_line() ────────────► stock guard,        │
//! │                                                     merge or append     │
//! │                                                                         │
//! │  Change quantity ───────► set_line_quantity() ───► < 1 removes,        │
//! │                                                     else stock guard    │
//! │                                                                         │
//! │  Click remove ──────────► remove_line()                                 │
//! │                                                                         │
//! │  Edit discount ─────────► set_discount_amount() / set_discount_percent()│
//! │                                                                         │
//! │  Every line mutation ends with a discount rebase, so subtotal,         │
//! │  discount and total are consistent after each call.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per product (adding again increases quantity)
//! - Every line quantity is in `1..=MAX_ITEM_QUANTITY`
//! - No line quantity exceeds that line's last-known available stock
//! - `0 ≤ discount_amount ≤ subtotal`

pub mod pricing;
pub mod stock_guard;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::money::{Money, Percent};
use crate::types::{CustomerId, PaymentClassification, ProductId, ProductSnapshot};
use crate::validation::{
    validate_product_id, validate_quantity, validate_unit_price, validate_upfront_payment,
};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

pub use pricing::{Discount, DiscountSource};

// =============================================================================
// Cart Line
// =============================================================================

/// One product-and-quantity entry in the cart.
///
/// `unit_price` is frozen when the line is created; `line_total` is always
/// derived from `unit_price × quantity` and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    /// Label used in stock messages (SKU or name, frozen)
    pub label: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    /// Last-known available stock for the stock guard
    pub available_stock: i64,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_snapshot(product: &ProductSnapshot, quantity: u32) -> Self {
        CartLine {
            product_id: product.id.clone(),
            label: product.label().to_string(),
            name: product.name.clone(),
            unit_price: product.unit_price,
            quantity,
            available_stock: product.available_stock,
            added_at: Utc::now(),
        }
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart of one sale-entry session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: Discount,
    customer: Option<CustomerId>,
    payment: Option<PaymentClassification>,
    upfront_payment: Money,
    created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            discount: Discount::none(),
            customer: None,
            payment: None,
            upfront_payment: Money::zero(),
            created_at: Utc::now(),
        }
    }

    // =========================================================================
    // Line Mutations
    // =========================================================================

    /// Adds `quantity` units of a product.
    ///
    /// ## Behavior
    /// - Product already in cart: its quantity grows (the frozen price stays,
    ///   the stock snapshot is refreshed from `product`)
    /// - Product not in cart: a new line is appended, out-of-stock products
    ///   are refused before any quantity math
    ///
    /// The cart is unchanged when an error is returned.
    pub fn add_line(&mut self, product: &ProductSnapshot, quantity: u32) -> Result<(), CartError> {
        validate_product_id(product.id.as_str())?;

        let existing = self.lines.iter().position(|l| l.product_id == product.id);
        if existing.is_none() {
            // Out of stock is reported before anything about the quantity
            stock_guard::check_available(product.label(), product.available_stock)?;
        }
        validate_quantity(quantity)?;

        if let Some(index) = existing {
            let line = &mut self.lines[index];
            let new_qty = u64::from(line.quantity) + u64::from(quantity);
            if new_qty > u64::from(MAX_ITEM_QUANTITY) {
                return Err(CartError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            let new_qty = new_qty as u32;
            stock_guard::check_quantity(&line.label, product.available_stock, new_qty)?;

            line.quantity = new_qty;
            line.available_stock = product.available_stock;
        } else {
            stock_guard::check_quantity(product.label(), product.available_stock, quantity)?;
            validate_unit_price(product.unit_price)?;

            if self.lines.len() >= MAX_CART_ITEMS {
                return Err(CartError::TooManyLines {
                    max: MAX_CART_ITEMS,
                });
            }

            self.lines.push(CartLine::from_snapshot(product, quantity));
        }

        self.discount.rebase(self.subtotal());
        Ok(())
    }

    /// Replaces a line's quantity. Anything below 1 removes the line.
    pub fn set_line_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Result<(), CartError> {
        if quantity < 1 {
            return self.remove_line(product_id);
        }

        if quantity > i64::from(MAX_ITEM_QUANTITY) {
            return Err(CartError::QuantityTooLarge {
                requested: quantity as u64,
                max: MAX_ITEM_QUANTITY,
            });
        }
        let quantity = quantity as u32;

        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;

        stock_guard::check_quantity(&line.label, line.available_stock, quantity)?;
        line.quantity = quantity;

        self.discount.rebase(self.subtotal());
        Ok(())
    }

    /// Removes a line. An amount discount larger than the new subtotal is
    /// clamped down to it.
    pub fn remove_line(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);

        if self.lines.len() == initial_len {
            return Err(CartError::NotInCart(product_id.clone()));
        }

        self.discount.rebase(self.subtotal());
        Ok(())
    }

    /// Updates a line's stock snapshot after the product was refetched.
    ///
    /// Quantities are left alone; the next mutation of the line is checked
    /// against the new figure.
    pub fn refresh_stock(&mut self, product_id: &ProductId, available: i64) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.clone()))?;
        line.available_stock = available;
        Ok(())
    }

    /// Lines whose quantity exceeds their (refreshed) stock snapshot.
    pub fn over_stock_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines
            .iter()
            .filter(|l| i64::from(l.quantity) > l.available_stock)
    }

    // =========================================================================
    // Discount
    // =========================================================================

    /// Sets the discount amount (clamped to `[0, subtotal]`).
    pub fn set_discount_amount(&mut self, value: Money) {
        let subtotal = self.subtotal();
        self.discount.set_amount(value, subtotal);
    }

    /// Sets the discount percentage (clamped to `[0, 100]`, 2 places).
    pub fn set_discount_percent(&mut self, value: Decimal) {
        let subtotal = self.subtotal();
        self.discount.set_percent(value, subtotal);
    }

    pub fn discount(&self) -> &Discount {
        &self.discount
    }

    pub fn discount_amount(&self) -> Money {
        self.discount.amount()
    }

    pub fn discount_percent(&self) -> Percent {
        self.discount.percent()
    }

    // =========================================================================
    // Customer & Payment
    // =========================================================================

    /// Selects (or clears) the customer. Only governs credit eligibility.
    pub fn select_customer(&mut self, customer: Option<CustomerId>) {
        self.customer = customer;
    }

    pub fn customer(&self) -> Option<&CustomerId> {
        self.customer.as_ref()
    }

    /// Chooses how the sale is settled. Leaving credit drops any upfront
    /// payment, which only applies to credit sales.
    pub fn choose_payment(&mut self, payment: PaymentClassification) {
        if !payment.is_credit() {
            self.upfront_payment = Money::zero();
        }
        self.payment = Some(payment);
    }

    pub fn payment(&self) -> Option<PaymentClassification> {
        self.payment
    }

    /// Part of a credit sale paid at the counter.
    pub fn set_upfront_payment(&mut self, amount: Money) -> Result<(), CartError> {
        validate_upfront_payment(amount)?;
        self.upfront_payment = amount;
        Ok(())
    }

    pub fn upfront_payment(&self) -> Money {
        self.upfront_payment
    }

    // =========================================================================
    // Derived Values
    // =========================================================================

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Sum of all line totals, recomputed on every call.
    pub fn subtotal(&self) -> Money {
        pricing::subtotal(self.lines.iter().map(CartLine::line_total))
    }

    /// `max(0, subtotal - discount_amount)`.
    pub fn total(&self) -> Money {
        pricing::total(self.subtotal(), self.discount.amount())
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Resets the cart to empty: lines, discount, customer and payment.
    pub fn clear(&mut self) {
        *self = Cart::new();
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

/// Cart totals summary, rounded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: u64,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub discount_percent: Decimal,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal().rounded(),
            discount_amount: cart.discount_amount().rounded(),
            discount_percent: cart.discount_percent().rounded(),
            total: cart.total().rounded(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockRejection;
    use rust_decimal_macros::dec;

    fn product(id: &str, price: Decimal, stock: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {}", id),
            sku: Some(format!("SKU-{}", id)),
            unit_price: Money::new(price),
            available_stock: stock,
            reorder_point: None,
        }
    }

    fn p(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_line() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(9.99), 10), 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal(), Money::new(dec!(19.98)));
    }

    #[test]
    fn test_add_same_product_increments_instead_of_duplicating() {
        let mut cart = Cart::new();
        let p1 = product("1", dec!(50), 10);
        cart.add_line(&p1, 2).unwrap();
        cart.add_line(&p1, 1).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_merge_keeps_frozen_price() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(50), 10), 1).unwrap();
        // Catalog price changed since the line was created
        cart.add_line(&product("1", dec!(65), 10), 1).unwrap();

        assert_eq!(cart.lines()[0].unit_price, Money::new(dec!(50)));
        assert_eq!(cart.subtotal(), Money::new(dec!(100)));
    }

    #[test]
    fn test_out_of_stock_refused_on_first_add() {
        let mut cart = Cart::new();
        let err = cart.add_line(&product("1", dec!(5), 0), 1).unwrap_err();
        assert_eq!(
            err,
            CartError::Stock(StockRejection::OutOfStock {
                product: "SKU-1".to_string()
            })
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_out_of_stock_reported_before_quantity() {
        let mut cart = Cart::new();
        let err = cart.add_line(&product("1", dec!(5), 0), 0).unwrap_err();
        assert!(matches!(err, CartError::Stock(StockRejection::OutOfStock { .. })));

        // In stock: the quantity itself is what is wrong
        let err = cart.add_line(&product("2", dec!(5), 4), 0).unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_blank_product_id_refused() {
        let mut cart = Cart::new();
        let err = cart.add_line(&product("  ", dec!(5), 4), 1).unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stock_guard_rejects_increase_and_keeps_quantity() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(5), 3), 3).unwrap();

        let err = cart.set_line_quantity(&p("1"), 4).unwrap_err();
        assert!(matches!(
            err,
            CartError::Stock(StockRejection::Limited {
                available: 3,
                requested: 4,
                ..
            })
        ));
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_add_beyond_stock_keeps_quantity() {
        let mut cart = Cart::new();
        let p1 = product("1", dec!(5), 3);
        cart.add_line(&p1, 3).unwrap();
        assert!(cart.add_line(&p1, 1).is_err());
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_set_quantity_below_one_removes() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(5), 10), 2).unwrap();
        cart.set_line_quantity(&p("1"), 0).unwrap();
        assert!(cart.is_empty());

        cart.add_line(&product("1", dec!(5), 10), 2).unwrap();
        cart.set_line_quantity(&p("1"), -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_product() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.set_line_quantity(&p("9"), 2),
            Err(CartError::NotInCart(p("9")))
        );
        assert_eq!(cart.remove_line(&p("9")), Err(CartError::NotInCart(p("9"))));
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new();
        let p1 = product("1", dec!(1), 5000);
        assert!(matches!(cart.add_line(&p1, 0), Err(CartError::Validation(_))));
        cart.add_line(&p1, 999).unwrap();
        assert!(matches!(
            cart.add_line(&p1, 1),
            Err(CartError::QuantityTooLarge { requested: 1000, .. })
        ));
        assert!(matches!(
            cart.set_line_quantity(&p("1"), 1000),
            Err(CartError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_too_many_lines() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_line(&product(&i.to_string(), dec!(1), 10), 1).unwrap();
        }
        assert_eq!(
            cart.add_line(&product("overflow", dec!(1), 10), 1),
            Err(CartError::TooManyLines { max: MAX_CART_ITEMS })
        );
    }

    #[test]
    fn test_discount_and_total() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(50), 10), 2).unwrap();
        cart.add_line(&product("2", dec!(30), 10), 1).unwrap();
        cart.set_discount_amount(Money::new(dec!(10)));

        assert_eq!(cart.subtotal(), Money::new(dec!(130)));
        assert_eq!(cart.total(), Money::new(dec!(120)));
    }

    #[test]
    fn test_discount_clamped_when_line_removed() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(50), 10), 2).unwrap();
        cart.add_line(&product("2", dec!(30), 10), 1).unwrap();
        cart.set_discount_amount(Money::new(dec!(50)));

        cart.remove_line(&p("1")).unwrap();

        assert_eq!(cart.subtotal(), Money::new(dec!(30)));
        assert_eq!(cart.discount_amount(), Money::new(dec!(30)));
        assert_eq!(cart.discount_percent(), Percent::HUNDRED);
        assert_eq!(cart.total(), Money::zero());
    }

    #[test]
    fn test_percent_discount_follows_line_changes() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(100), 10), 1).unwrap();
        cart.set_discount_percent(dec!(10));
        cart.set_line_quantity(&p("1"), 3).unwrap();

        assert_eq!(cart.discount_amount(), Money::new(dec!(30)));
        assert_eq!(cart.total(), Money::new(dec!(270)));
    }

    #[test]
    fn test_refresh_stock_flags_over_stock_lines() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(5), 10), 4).unwrap();
        cart.refresh_stock(&p("1"), 2).unwrap();

        assert_eq!(cart.over_stock_lines().count(), 1);
        assert_eq!(cart.lines()[0].quantity, 4);
        // Lowering to what is left passes the guard again
        cart.set_line_quantity(&p("1"), 2).unwrap();
        assert_eq!(cart.over_stock_lines().count(), 0);
    }

    #[test]
    fn test_choose_payment_drops_upfront_outside_credit() {
        let mut cart = Cart::new();
        cart.choose_payment(PaymentClassification::Credit);
        cart.set_upfront_payment(Money::from_cents(2000)).unwrap();
        assert_eq!(cart.upfront_payment(), Money::from_cents(2000));

        cart.choose_payment(PaymentClassification::Cash);
        assert!(cart.upfront_payment().is_zero());
        assert!(cart.set_upfront_payment(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(5), 10), 2).unwrap();
        cart.set_discount_amount(Money::new(dec!(2)));
        cart.select_customer(Some(CustomerId::new("c-1")));
        cart.choose_payment(PaymentClassification::Transfer);

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.discount_amount().is_zero());
        assert!(cart.customer().is_none());
        assert!(cart.payment().is_none());
    }

    #[test]
    fn test_totals_are_rounded() {
        let mut cart = Cart::new();
        cart.add_line(&product("1", dec!(33.33), 10), 1).unwrap();
        cart.set_discount_percent(dec!(12.5));

        let totals = cart.totals();
        assert_eq!(totals.discount_amount, Money::new(dec!(4.17)));
        assert_eq!(totals.total, Money::new(dec!(29.16)));
        assert_eq!(totals.discount_percent, dec!(12.5));
    }
}
