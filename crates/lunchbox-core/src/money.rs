//! # Money Module
//!
//! Provides the `Money` type for monetary values and `DiscountRate` for
//! bundle discount tiers.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Discounts stack: 5 meals × $10.99, 20% bundle, then 15% coupon.        │
//! │  Intermediate amounts have more than two decimal places.               │
//! │                                                                         │
//! │  OUR SOLUTION: exact decimals, rounded only at the edges               │
//! │    • arithmetic keeps every digit                                      │
//! │    • cents()/Display round half away from zero                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lunchbox_core::money::{DiscountRate, Money};
//!
//! let price = Money::from_cents(1099); // $10.99
//! let total = price * 5;              // $54.95
//! let discount = total.percent_of(DiscountRate::from_bps(2000));
//!
//! assert_eq!(discount.to_string(), "$10.99");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Decimal places shown to users and stored in the database.
const DISPLAY_PLACES: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in currency units (dollars), held as an exact decimal.
///
/// ## Design Decisions
/// - **Signed**: add-ons may carry negative prices ("main only" discounts)
/// - **Exact**: no rounding until [`Money::rounded`], [`Money::cents`] or display
/// - **Serialized as a decimal string** so no precision is lost in JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(as = "String")] Decimal);

impl Money {
    /// Creates a Money value from cents (the unit used in storage).
    ///
    /// ## Example
    /// ```rust
    /// use lunchbox_core::money::Money;
    ///
    /// let price = Money::from_cents(1250);
    /// assert_eq!(price.to_string(), "$12.50");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, DISPLAY_PLACES))
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -$5.50.
    pub fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money::from_cents(major * 100 - minor)
        } else {
            Money::from_cents(major * 100 + minor)
        }
    }

    /// Wraps an already-computed decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the amount rounded to whole cents.
    ///
    /// ## Example
    /// ```rust
    /// use lunchbox_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// // 54.945 → 5495 (half away from zero)
    /// let amount = Money::from_decimal(Decimal::new(54945, 3));
    /// assert_eq!(amount.cents(), 5495);
    /// ```
    pub fn cents(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or_default()
    }

    /// Returns this amount rounded to two decimal places.
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
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

    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the share of this amount described by `rate`.
    ///
    /// ## Example
    /// ```rust
    /// use lunchbox_core::money::{DiscountRate, Money};
    ///
    /// let subtotal = Money::from_cents(2400);
    /// let discount = subtotal.percent_of(DiscountRate::from_bps(500));
    /// assert_eq!(discount, Money::from_cents(120));
    /// ```
    pub fn percent_of(&self, rate: DiscountRate) -> Money {
        Money(self.0 * rate.fraction())
    }

    /// Returns `percent`% of this amount, where `percent` is on a 0-100 scale.
    pub fn percentage(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Floors the amount at zero.
    pub fn clamp_non_negative(self) -> Money {
        if self.is_negative() {
            Money::zero()
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display rounds to cents: `$12.34`, `-$5.50`.
///
/// ## Note
/// This is the only place amounts are rounded for people to read. The
/// frontend receives exact decimal strings and formats them the same way.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.rounded().0.abs();
        rounded.rescale(DISPLAY_PLACES);
        let sign = if self.rounded().is_negative() { "-" } else { "" };
        write!(f, "{}${}", sign, rounded)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

/// Multiplication by a count of meals.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5%. Bundle tiers are exact
/// multiples, which keeps the tier table free of float comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the rate as an exact fraction (500 bps → 0.05).
    pub fn fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// Returns the rate as a percentage (500 bps → 5).
    pub fn percent(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent().normalize())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
