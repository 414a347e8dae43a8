//! # Orders
//!
//! The frozen record handed to checkout once the parent confirms the cart.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Cart + PricingResult ──► Order::from_checkout ──► PendingPayment     │
//! │                                                      │        │        │
//! │                                     payment confirmed│        │abandon │
//! │                                                      ▼        ▼        │
//! │                                                    Paid   Cancelled    │
//! │                                                                         │
//! │   Paid and Cancelled are final.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines use the snapshot pattern: names, codes and prices are copied at
//! checkout so later catalog edits never change a placed order.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, MealLine};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::PricingResult;
use crate::types::Coupon;

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Persisted, waiting for the payment provider.
    PendingPayment,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, OrderStatus::PendingPayment)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::PendingPayment
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// One meal as it was ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub main_id: String,
    /// Main name at checkout (frozen).
    pub main_name: String,
    pub add_on_names: Vec<String>,
    pub side_name: Option<String>,
    /// Label code of the side at checkout (frozen).
    pub side_code: Option<String>,
    pub fruit_name: Option<String>,
    pub fruit_code: Option<String>,
    pub child_id: String,
    pub child_name: String,
    pub class_name: Option<String>,
    pub school_id: String,
    pub school_name: String,
    #[ts(as = "String")]
    pub delivery_date: NaiveDate,
    /// Main plus add-ons, before any discount.
    pub line_total_cents: i64,
}

impl OrderLine {
    pub fn from_meal_line(line: &MealLine) -> Self {
        OrderLine {
            id: line.id.clone(),
            main_id: line.main.id.clone(),
            main_name: line.main.name.clone(),
            add_on_names: line.add_ons.iter().map(|a| a.name.clone()).collect(),
            side_name: line.side.as_ref().map(|s| s.name.clone()),
            side_code: line.side.as_ref().and_then(|s| s.short_code.clone()),
            fruit_name: line.fruit.as_ref().map(|f| f.name.clone()),
            fruit_code: line.fruit.as_ref().and_then(|f| f.short_code.clone()),
            child_id: line.child.id.clone(),
            child_name: line.child.name.clone(),
            class_name: line.child.class_name.clone(),
            school_id: line.school.id.clone(),
            school_name: line.school.name.clone(),
            delivery_date: line.delivery_date,
            line_total_cents: line.total().cents(),
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A checked-out cart with its pricing breakdown in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub subtotal_cents: i64,
    pub bundle_discount_bps: u32,
    pub bundle_discount_cents: i64,
    pub coupon_discount_cents: i64,
    pub final_total_cents: i64,
    pub coupon_id: Option<String>,
    pub coupon_code: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Freezes `cart` and `pricing` into a pending order.
    ///
    /// `pricing` must come from `compute_totals(cart, coupon)`. An empty cart
    /// is rejected: checkout is blocked here, not in the pricing math.
    pub fn from_checkout(
        cart: &Cart,
        pricing: &PricingResult,
        user_id: &str,
        coupon: Option<&Coupon>,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: OrderStatus::PendingPayment,
            lines: cart.lines().iter().map(OrderLine::from_meal_line).collect(),
            subtotal_cents: pricing.subtotal.cents(),
            bundle_discount_bps: pricing.bundle_discount_rate.bps(),
            bundle_discount_cents: pricing.bundle_discount_amount.cents(),
            coupon_discount_cents: pricing.coupon_discount_amount.cents(),
            final_total_cents: pricing.final_total.cents(),
            coupon_id: coupon.map(|c| c.id.clone()),
            coupon_code: coupon.map(|c| c.code.clone()),
            created_at: now,
            updated_at: now,
            paid_at: None,
        })
    }

    #[inline]
    pub fn final_total(&self) -> Money {
        Money::from_cents(self.final_total_cents)
    }

    pub fn meal_count(&self) -> usize {
        self.lines.len()
    }

    /// Payment confirmed.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition(OrderStatus::Paid, now)?;
        self.paid_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.transition(OrderStatus::Cancelled, now)
    }

    fn transition(&mut self, to: OrderStatus, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status.is_final() {
            return Err(CoreError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::line;
    use crate::pricing::compute_totals;
    use crate::types::DiscountType;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap()
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_line(line(1200)).unwrap();
        cart.add_line(line(1200)).unwrap();
        cart
    }

    #[test]
    fn test_from_checkout() {
        let cart = cart();
        let coupon = Coupon {
            id: "cp1".to_string(),
            code: "TAKE2".to_string(),
            discount_type: DiscountType::Fixed,
            discount_amount: Decimal::from(2),
            expiry_date: now(),
            is_single_use: true,
            is_active: true,
            use_count: 0,
        };
        let pricing = compute_totals(&cart, Some(&coupon));
        let order = Order::from_checkout(&cart, &pricing, "user-1", Some(&coupon), now()).unwrap();

        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.meal_count(), 2);
        assert_eq!(order.subtotal_cents, 2400);
        assert_eq!(order.bundle_discount_bps, 500);
        assert_eq!(order.bundle_discount_cents, 120);
        assert_eq!(order.coupon_discount_cents, 200);
        assert_eq!(order.final_total_cents, 2080);
        assert_eq!(order.coupon_code.as_deref(), Some("TAKE2"));
        assert_eq!(order.lines[0].line_total_cents, 1200);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let cart = Cart::new();
        let pricing = compute_totals(&cart, None);
        assert!(matches!(
            Order::from_checkout(&cart, &pricing, "user-1", None, now()),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_lines_are_snapshots() {
        let mut cart = cart();
        let pricing = compute_totals(&cart, None);
        let order = Order::from_checkout(&cart, &pricing, "user-1", None, now()).unwrap();

        cart.clear();
        assert_eq!(order.lines[0].main_name, "Main m1");
        assert_eq!(order.lines[0].school_name, "School sch1");
    }

    #[test]
    fn test_status_transitions() {
        let cart = cart();
        let pricing = compute_totals(&cart, None);
        let mut order = Order::from_checkout(&cart, &pricing, "user-1", None, now()).unwrap();

        order.mark_paid(now()).unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.paid_at, Some(now()));

        assert!(matches!(
            order.cancel(now()),
            Err(CoreError::InvalidStatusTransition {
                from: OrderStatus::Paid,
                to: OrderStatus::Cancelled
            })
        ));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(OrderStatus::PendingPayment.to_string(), "pending_payment");
        assert_eq!(OrderStatus::default(), OrderStatus::PendingPayment);
    }
}
