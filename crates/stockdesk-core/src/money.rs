//! # Money Module
//!
//! Provides the `Money` and `Percent` types used by the cart and the pricing
//! calculator.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE DISCOUNT PROBLEM                                                   │
//! │                                                                         │
//! │  Discounts are edited in two ways: as an amount or as a percentage.     │
//! │    subtotal 130.00, discount 7.5%  → 9.75                              │
//! │    subtotal  33.33, discount 12.5% → 4.16625                           │
//! │                                                                         │
//! │  Rounding each intermediate step to cents makes the two views drift    │
//! │  apart after a few edits. So:                                           │
//! │    • intermediate values keep full decimal precision                    │
//! │    • rounding to 2 places happens ONLY for display and submission       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use stockdesk_core::money::{Money, Percent};
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price.multiply_quantity(3); // 32.97
//! assert_eq!(line, Money::from_cents(3297));
//!
//! let ten_percent = Percent::clamped(Decimal::from(10));
//! assert_eq!(line.percent_of(ten_percent).rounded(), Money::from_cents(330));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Decimal places used for display and submission.
pub const CURRENCY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value with full decimal precision.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  ProductSnapshot.unit_price ──► CartLine.unit_price ──► line_total()   │
/// │                                                                         │
/// │  Cart.subtotal() ──► Discount (amount ⇄ percent) ──► Cart.total()      │
/// │                                                                         │
/// │  Cart.total() ──► rounded() ──► SalePayload.total_amount               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CURRENCY_DECIMALS))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ```rust
    /// use stockdesk_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_cents(897));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns `percent`% of this amount, unrounded.
    pub fn percent_of(&self, percent: Percent) -> Money {
        Money(self.0 * percent.value() / Decimal::ONE_HUNDRED)
    }

    /// Expresses this amount as a percentage of `whole`, unrounded.
    ///
    /// Returns zero when `whole` is zero (nothing to take a share of).
    pub fn ratio_percent(&self, whole: Money) -> Percent {
        if whole.is_zero() {
            return Percent::ZERO;
        }
        Percent::exact(self.0 * Decimal::ONE_HUNDRED / whole.0)
    }

    /// Restricts the value to `[min, max]`.
    ///
    /// If `min > max` the result is `min`.
    pub fn clamp_to(self, min: Money, max: Money) -> Money {
        if self > max {
            max.max(min)
        } else if self < min {
            min
        } else {
            self
        }
    }

    /// Rounds to currency precision (2 places, half away from zero).
    ///
    /// Only call this at display or submission time.
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use stockdesk_core::money::Money;
    ///
    /// assert_eq!(Money::new(dec!(4.16625)).rounded(), Money::new(dec!(4.17)));
    /// assert_eq!(Money::new(dec!(0.005)).rounded(), Money::new(dec!(0.01)));
    /// ```
    pub fn rounded(&self) -> Money {
        let mut value = self
            .0
            .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(CURRENCY_DECIMALS);
        Money(value)
    }
}

/// Renders the rounded value with exactly two decimals (`"10.50"`).
///
/// Currency symbols are a presentation concern and are added by the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded().0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Percent Type
// =============================================================================

/// A percentage in `[0, 100]`.
///
/// ## Two Constructors
/// - [`Percent::clamped`]: for values typed by the user. Clamped and rounded
///   to 2 decimal places so repeated edits cannot accumulate float-like drift.
/// - [`Percent::exact`]: for values derived from an amount. Clamped but kept
///   at full precision so the amount view stays authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(Decimal);

impl Percent {
    pub const ZERO: Percent = Percent(Decimal::ZERO);
    pub const HUNDRED: Percent = Percent(Decimal::ONE_HUNDRED);

    /// User-entered percentage: clamped to `[0, 100]`, rounded to 2 places.
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use stockdesk_core::money::Percent;
    ///
    /// assert_eq!(Percent::clamped(dec!(12.3456)).value(), dec!(12.35));
    /// assert_eq!(Percent::clamped(dec!(150)).value(), dec!(100));
    /// assert_eq!(Percent::clamped(dec!(-3)).value(), dec!(0));
    /// ```
    pub fn clamped(value: Decimal) -> Self {
        Percent(
            clamp_unit(value)
                .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Derived percentage: clamped to `[0, 100]`, precision preserved.
    pub fn exact(value: Decimal) -> Self {
        Percent(clamp_unit(value))
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Rounded to 2 places for display and submission.
    pub fn rounded(&self) -> Decimal {
        self.0
            .round_dp_with_strategy(CURRENCY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.rounded().normalize())
    }
}

fn clamp_unit(value: Decimal) -> Decimal {
    if value < Decimal::ZERO {
        Decimal::ZERO
    } else if value > Decimal::ONE_HUNDRED {
        Decimal::ONE_HUNDRED
    } else {
        value
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
