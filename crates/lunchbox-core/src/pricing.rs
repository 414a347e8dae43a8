//! # Pricing Engine
//!
//! Turns a cart and an optional, already-validated coupon into a
//! [`PricingResult`].
//!
//! ## Discount Stacking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   subtotal (cart.total)                                                 │
//! │       │                                                                 │
//! │       ├── × bundle rate (by meal count) ──► bundle_discount_amount     │
//! │       ▼                                                                 │
//! │   bundle_discounted_total                                               │
//! │       │                                                                 │
//! │       ├── percentage coupon: × amount / 100                            │
//! │       ├── fixed coupon:      min(amount, bundle_discounted_total)      │
//! │       ▼                                                                 │
//! │   final_total = max(0, bundle_discounted_total - coupon_discount)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bundle Tiers
//!
//! | Meals | Rate |
//! |-------|------|
//! | 5+    | 20%  |
//! | 3-4   | 10%  |
//! | 2     | 5%   |
//! | 0-1   | 0%   |
//!
//! This is the only tier table. The cart drawer message comes from
//! [`bundle_hint`], which reads the same table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::money::{DiscountRate, Money};
use crate::types::{Coupon, DiscountType};

/// Bundle tiers as (minimum meals, rate), highest first.
const BUNDLE_TIERS: [(usize, DiscountRate); 3] = [
    (5, DiscountRate::from_bps(2000)),
    (3, DiscountRate::from_bps(1000)),
    (2, DiscountRate::from_bps(500)),
];

// =============================================================================
// Bundle Discount
// =============================================================================

/// Bundle discount earned by ordering `meal_count` meals.
///
/// ## Example
/// ```rust
/// use lunchbox_core::pricing::bundle_discount_rate;
///
/// assert_eq!(bundle_discount_rate(1).bps(), 0);
/// assert_eq!(bundle_discount_rate(4).bps(), 1000);
/// assert_eq!(bundle_discount_rate(12).bps(), 2000);
/// ```
pub fn bundle_discount_rate(meal_count: usize) -> DiscountRate {
    BUNDLE_TIERS
        .iter()
        .find(|(min_meals, _)| meal_count >= *min_meals)
        .map(|(_, rate)| *rate)
        .unwrap_or_default()
}

/// The next tier up from the current meal count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NextTier {
    /// Additional meals needed to reach the tier.
    pub meals_needed: usize,
    pub rate: DiscountRate,
}

/// What the cart drawer tells the parent about bundle savings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleHint {
    pub meal_count: usize,
    pub current_rate: DiscountRate,
    /// `None` once the top tier is reached.
    pub next_tier: Option<NextTier>,
}

impl BundleHint {
    pub fn message(&self) -> String {
        match (self.current_rate.is_zero(), self.next_tier) {
            (_, Some(next)) => {
                let meals = if next.meals_needed == 1 { "meal" } else { "meals" };
                if self.current_rate.is_zero() {
                    format!("Add {} more {} to save {}", next.meals_needed, meals, next.rate)
                } else {
                    format!(
                        "You're saving {}. Add {} more {} to save {}",
                        self.current_rate, next.meals_needed, meals, next.rate
                    )
                }
            }
            (false, None) => format!("You're saving {}", self.current_rate),
            (true, None) => String::new(),
        }
    }
}

/// Builds the cart drawer hint for `meal_count` meals.
///
/// ## Example
/// ```rust
/// use lunchbox_core::pricing::bundle_hint;
///
/// let hint = bundle_hint(3);
/// assert_eq!(hint.current_rate.bps(), 1000);
/// assert_eq!(hint.next_tier.unwrap().meals_needed, 2);
/// ```
pub fn bundle_hint(meal_count: usize) -> BundleHint {
    let next_tier = BUNDLE_TIERS
        .iter()
        .rev()
        .find(|(min_meals, _)| *min_meals > meal_count)
        .map(|(min_meals, rate)| NextTier {
            meals_needed: min_meals - meal_count,
            rate: *rate,
        });

    BundleHint {
        meal_count,
        current_rate: bundle_discount_rate(meal_count),
        next_tier,
    }
}

// =============================================================================
// Pricing Result
// =============================================================================

/// Full pricing breakdown for a cart.
///
/// Always derived, never stored on its own. Amounts are exact; round with
/// [`Money::cents`] or display formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingResult {
    pub meal_count: usize,
    pub subtotal: Money,
    pub bundle_discount_rate: DiscountRate,
    pub bundle_discount_amount: Money,
    pub bundle_discounted_total: Money,
    pub coupon_discount_amount: Money,
    pub final_total: Money,
    /// Combined discount as a percentage of the subtotal; 0 for an empty cart.
    #[ts(as = "String")]
    pub total_discount_percentage: Decimal,
}

impl PricingResult {
    pub fn total_discount(&self) -> Money {
        self.bundle_discount_amount + self.coupon_discount_amount
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Prices `cart`, stacking the bundle discount and then `coupon`.
///
/// The coupon must already have passed [`crate::coupon::validate_coupon`];
/// expiry and the active flag are not re-checked here. Pure: neither the
/// cart nor the coupon is touched.
pub fn compute_totals(cart: &Cart, coupon: Option<&Coupon>) -> PricingResult {
    compute_totals_for(cart.total(), cart.meal_count(), coupon)
}

/// Same as [`compute_totals`], from a subtotal and meal count.
pub fn compute_totals_for(
    subtotal: Money,
    meal_count: usize,
    coupon: Option<&Coupon>,
) -> PricingResult {
    let rate = bundle_discount_rate(meal_count);
    let bundle_discount_amount = subtotal.percent_of(rate);
    let bundle_discounted_total = subtotal - bundle_discount_amount;

    let coupon_discount_amount = match coupon {
        None => Money::zero(),
        Some(c) => match c.discount_type {
            DiscountType::Percentage => bundle_discounted_total.percentage(c.discount_amount),
            DiscountType::Fixed => Money::from_decimal(c.discount_amount)
                .min(bundle_discounted_total)
                .clamp_non_negative(),
        },
    };

    let final_total = (bundle_discounted_total - coupon_discount_amount).clamp_non_negative();

    let total_discount_percentage = if subtotal.is_zero() {
        Decimal::ZERO
    } else {
        (bundle_discount_amount + coupon_discount_amount).amount() / subtotal.amount()
            * Decimal::ONE_HUNDRED
    };

    PricingResult {
        meal_count,
        subtotal,
        bundle_discount_rate: rate,
        bundle_discount_amount,
        bundle_discounted_total,
        coupon_discount_amount,
        final_total,
        total_discount_percentage,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::line;
    use chrono::{TimeZone, Utc};

    fn coupon(discount_type: DiscountType, amount: i64) -> Coupon {
        Coupon {
            id: "cp1".to_string(),
            code: "SAVE".to_string(),
            discount_type,
            discount_amount: Decimal::from(amount),
            expiry_date: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            is_single_use: false,
            is_active: true,
            use_count: 0,
        }
    }

    fn cart_of(prices: &[i64]) -> Cart {
        let mut cart = Cart::new();
        for &cents in prices {
            cart.add_line(line(cents)).unwrap();
        }
        cart
    }

    #[test]
    fn test_bundle_tier_table() {
        let expected = [
            (0, 0),
            (1, 0),
            (2, 500),
            (3, 1000),
            (4, 1000),
            (5, 2000),
            (6, 2000),
            (10, 2000),
        ];
        for (count, bps) in expected {
            assert_eq!(bundle_discount_rate(count).bps(), bps, "meal count {}", count);
        }
    }

    #[test]
    fn test_two_meals_no_coupon() {
        let result = compute_totals(&cart_of(&[1200, 1200]), None);
        assert_eq!(result.bundle_discount_rate.bps(), 500);
        assert_eq!(result.bundle_discount_amount, Money::from_cents(120));
        assert_eq!(result.final_total, Money::from_cents(2280));
    }

    #[test]
    fn test_five_meals_percentage_coupon() {
        let cart = cart_of(&[1500; 5]);
        assert_eq!(cart.total(), Money::from_cents(7500));

        let c = coupon(DiscountType::Percentage, 10);
        let result = compute_totals(&cart, Some(&c));
        assert_eq!(result.bundle_discount_rate.bps(), 2000);
        assert_eq!(result.bundle_discount_amount, Money::from_cents(1500));
        assert_eq!(result.bundle_discounted_total, Money::from_cents(6000));
        assert_eq!(result.coupon_discount_amount, Money::from_cents(600));
        assert_eq!(result.final_total, Money::from_cents(5400));
        assert_eq!(result.total_discount_percentage, Decimal::from(28));
    }

    #[test]
    fn test_fixed_coupon_clamps_to_total() {
        let c = coupon(DiscountType::Fixed, 20);
        let result = compute_totals(&cart_of(&[1500]), Some(&c));
        assert_eq!(result.bundle_discount_amount, Money::zero());
        assert_eq!(result.coupon_discount_amount, Money::from_cents(1500));
        assert_eq!(result.final_total, Money::zero());
    }

    #[test]
    fn test_large_fixed_coupon() {
        let c = coupon(DiscountType::Fixed, 1000);
        let result = compute_totals_for(Money::from_cents(5000), 1, Some(&c));
        assert_eq!(result.coupon_discount_amount, Money::from_cents(5000));
        assert_eq!(result.final_total, Money::zero());
    }

    #[test]
    fn test_empty_cart() {
        for c in [
            None,
            Some(coupon(DiscountType::Fixed, 5)),
            Some(coupon(DiscountType::Percentage, 50)),
        ] {
            let result = compute_totals(&Cart::new(), c.as_ref());
            assert_eq!(result.final_total, Money::zero());
            assert_eq!(result.total_discount(), Money::zero());
            assert_eq!(result.total_discount_percentage, Decimal::ZERO);
        }
    }

    #[test]
    fn test_idempotent() {
        let cart = cart_of(&[1099, 1250, 899]);
        let c = coupon(DiscountType::Percentage, 15);
        let first = compute_totals(&cart, Some(&c));
        let second = compute_totals(&cart, Some(&c));
        assert_eq!(first, second);
        assert_eq!(cart.total(), Money::from_cents(3248));
    }

    #[test]
    fn test_final_total_never_negative() {
        let c = coupon(DiscountType::Fixed, 100);
        for prices in [&[][..], &[100][..], &[0, 0][..], &[999, 1, 5][..]] {
            let result = compute_totals(&cart_of(prices), Some(&c));
            assert!(!result.final_total.is_negative());
        }
    }

    #[test]
    fn test_crossing_tier_may_lower_final_total() {
        // 4 × $10 at 10% = $36.00; a fifth $1 meal earns 20%: $41 × 0.8 = $32.80
        let four = compute_totals(&cart_of(&[1000; 4]), None);
        let five = compute_totals(&cart_of(&[1000, 1000, 1000, 1000, 100]), None);
        assert!(five.subtotal > four.subtotal);
        assert!(five.final_total < four.final_total);
    }

    #[test]
    fn test_bundle_hint() {
        let hint = bundle_hint(0);
        assert!(hint.current_rate.is_zero());
        assert_eq!(
            hint.next_tier,
            Some(NextTier {
                meals_needed: 2,
                rate: DiscountRate::from_bps(500)
            })
        );
        assert_eq!(hint.message(), "Add 2 more meals to save 5%");

        let hint = bundle_hint(4);
        assert_eq!(hint.current_rate.bps(), 1000);
        assert_eq!(hint.message(), "You're saving 10%. Add 1 more meal to save 20%");

        let hint = bundle_hint(7);
        assert_eq!(hint.next_tier, None);
        assert_eq!(hint.message(), "You're saving 20%");
    }

    #[test]
    fn test_hint_agrees_with_rate() {
        for count in 0..12 {
            assert_eq!(bundle_hint(count).current_rate, bundle_discount_rate(count));
        }
    }
}
