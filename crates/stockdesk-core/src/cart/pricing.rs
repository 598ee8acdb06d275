//! # Pricing Calculator
//!
//! Keeps subtotal, discount amount, discount percent and total consistent.
//!
//! ## Two-Way Discount Binding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   user edits amount ──► set_amount ──► percent = amount / subtotal×100 │
//! │                                                                         │
//! │   user edits percent ─► set_percent ─► amount = percent / 100×subtotal │
//! │                                                                         │
//! │   line mutation ──────► rebase ──────► recompute from the channel the  │
//! │                                        user edited last                 │
//! │                                                                         │
//! │  Both views are always recomputed from ONE source value, never         │
//! │  adjusted incrementally. Invariant after every call:                   │
//! │      0 ≤ amount ≤ subtotal                                              │
//! │      amount == subtotal × percent / 100   (within rounding)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{Money, Percent};

/// Which discount field the user edited last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountSource {
    #[default]
    Amount,
    Percent,
}

/// The cart-level discount, held as two synchronized views.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Discount {
    amount: Money,
    percent: Percent,
    source: DiscountSource,
}

impl Discount {
    /// No discount.
    pub fn none() -> Self {
        Discount::default()
    }

    #[inline]
    pub fn amount(&self) -> Money {
        self.amount
    }

    #[inline]
    pub fn percent(&self) -> Percent {
        self.percent
    }

    #[inline]
    pub fn source(&self) -> DiscountSource {
        self.source
    }

    /// Sets the discount as an amount, clamped to `[0, subtotal]`.
    pub fn set_amount(&mut self, value: Money, subtotal: Money) {
        let clamped = value.clamp_to(Money::zero(), subtotal);
        self.amount = clamped;
        self.percent = clamped.ratio_percent(subtotal);
        self.source = DiscountSource::Amount;
    }

    /// Sets the discount as a percentage, clamped to `[0, 100]` and rounded
    /// to 2 places before use.
    pub fn set_percent(&mut self, value: Decimal, subtotal: Money) {
        let percent = Percent::clamped(value);
        self.percent = percent;
        self.amount = subtotal.percent_of(percent);
        self.source = DiscountSource::Percent;
    }

    /// Recomputes both views after the subtotal changed.
    ///
    /// An amount-sourced discount is clamped to the new subtotal; a
    /// percent-sourced one follows the subtotal.
    pub fn rebase(&mut self, subtotal: Money) {
        match self.source {
            DiscountSource::Amount => self.set_amount(self.amount, subtotal),
            DiscountSource::Percent => self.set_percent(self.percent.value(), subtotal),
        }
    }
}

/// Sum of line totals.
pub fn subtotal<I>(line_totals: I) -> Money
where
    I: IntoIterator<Item = Money>,
{
    line_totals.into_iter().sum()
}

/// `max(0, subtotal - discount)`.
pub fn total(subtotal: Money, discount: Money) -> Money {
    (subtotal - discount).max(Money::zero())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(value: Decimal) -> Money {
        Money::new(value)
    }

    #[test]
    fn test_set_amount_derives_percent() {
        let mut d = Discount::none();
        d.set_amount(money(dec!(10)), money(dec!(130)));
        assert_eq!(d.amount(), money(dec!(10)));
        assert_eq!(d.percent().rounded(), dec!(7.69));
        assert_eq!(d.source(), DiscountSource::Amount);
    }

    #[test]
    fn test_set_amount_clamps_to_subtotal() {
        let mut d = Discount::none();
        d.set_amount(money(dec!(150)), money(dec!(100)));
        assert_eq!(d.amount(), money(dec!(100)));
        assert_eq!(d.percent(), Percent::HUNDRED);
        assert_eq!(total(money(dec!(100)), d.amount()), Money::zero());
    }

    #[test]
    fn test_negative_amount_clamps_to_zero() {
        let mut d = Discount::none();
        d.set_amount(money(dec!(-5)), money(dec!(100)));
        assert_eq!(d.amount(), Money::zero());
        assert!(d.percent().is_zero());
    }

    #[test]
    fn test_amount_on_empty_subtotal() {
        let mut d = Discount::none();
        d.set_amount(money(dec!(20)), Money::zero());
        assert_eq!(d.amount(), Money::zero());
        assert!(d.percent().is_zero());
    }

    #[test]
    fn test_set_percent_rounds_and_clamps() {
        let mut d = Discount::none();
        d.set_percent(dec!(12.345), money(dec!(200)));
        assert_eq!(d.percent().value(), dec!(12.35));
        assert_eq!(d.amount(), money(dec!(24.70)));

        d.set_percent(dec!(140), money(dec!(200)));
        assert_eq!(d.amount(), money(dec!(200)));
    }

    #[test]
    fn test_rebase_amount_source_clamps() {
        let mut d = Discount::none();
        d.set_amount(money(dec!(50)), money(dec!(130)));
        d.rebase(money(dec!(30)));
        assert_eq!(d.amount(), money(dec!(30)));
        assert_eq!(d.percent(), Percent::HUNDRED);
    }

    #[test]
    fn test_rebase_percent_source_follows_subtotal() {
        let mut d = Discount::none();
        d.set_percent(dec!(10), money(dec!(100)));
        d.rebase(money(dec!(250)));
        assert_eq!(d.amount(), money(dec!(25)));
        assert_eq!(d.percent().value(), dec!(10));
    }

    #[test]
    fn test_total_never_negative() {
        assert_eq!(total(money(dec!(10)), money(dec!(15))), Money::zero());
        assert_eq!(total(money(dec!(130)), money(dec!(10))), money(dec!(120)));
    }
}
