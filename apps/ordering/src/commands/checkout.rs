//! # Checkout Commands
//!
//! Turns the cart into a pending order and drives it to paid or cancelled.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  checkout ──► pending_payment ──finalize_order──► paid                  │
//! │                     │                              (coupon booked)      │
//! │                     └────────cancel_order────────► cancelled            │
//! │                                                                         │
//! │  The payment session itself is created by the external provider using  │
//! │  the order id and final total returned here.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use lunchbox_core::{compute_totals, CoreError, Coupon, Order};

use crate::commands::coupon::lookup_valid_coupon;
use crate::error::{ApiError, CouponReason};
use crate::state::{CartSession, CartState, ConfigState, DbState};

/// What the payment step needs to know about a new order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: String,
    pub meal_count: usize,
    pub subtotal_cents: i64,
    pub bundle_discount_cents: i64,
    pub coupon_discount_cents: i64,
    pub final_total_cents: i64,
    pub final_total_display: String,
    pub coupon_code: Option<String>,
}

impl CheckoutResponse {
    fn from_order(order: &Order, config: &ConfigState) -> Self {
        CheckoutResponse {
            order_id: order.id.clone(),
            meal_count: order.meal_count(),
            subtotal_cents: order.subtotal_cents,
            bundle_discount_cents: order.bundle_discount_cents,
            coupon_discount_cents: order.coupon_discount_cents,
            final_total_cents: order.final_total_cents,
            final_total_display: config.format_money(order.final_total()),
            coupon_code: order.coupon_code.clone(),
        }
    }
}

/// Freezes the cart into a pending order for `user_id`.
///
/// The applied coupon is re-validated first; one that expired, was
/// deactivated, or is a single-use coupon this user already redeemed is
/// dropped from the cart and checkout fails. On success the cart is cleared.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    user_id: &str,
) -> Result<CheckoutResponse, ApiError> {
    debug!(user_id = %user_id, "checkout command");

    let session = cart.with_session(CartSession::clone);
    if session.cart.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let coupon = match &session.coupon {
        Some(applied) => match revalidate_coupon(db, &applied.code, user_id).await {
            Ok(coupon) => Some(coupon),
            Err(err) => {
                warn!(code = %applied.code, "Coupon dropped at checkout: {}", err.message);
                cart.with_session_mut(|s| s.coupon = None);
                return Err(err);
            }
        },
        None => None,
    };

    let pricing = compute_totals(&session.cart, coupon.as_ref());
    let order = Order::from_checkout(&session.cart, &pricing, user_id, coupon.as_ref(), Utc::now())?;
    db.inner().orders().insert_order(&order).await?;

    cart.with_session_mut(CartSession::reset);

    info!(
        order_id = %order.id,
        meals = order.meal_count(),
        total_cents = order.final_total_cents,
        "Order created"
    );

    Ok(CheckoutResponse::from_order(&order, config))
}

async fn revalidate_coupon(
    db: &DbState,
    code: &str,
    user_id: &str,
) -> Result<Coupon, ApiError> {
    let coupon = lookup_valid_coupon(db, code).await?;
    if coupon.is_single_use && db.inner().coupons().has_redeemed(&coupon.id, user_id).await? {
        return Err(ApiError::coupon(
            CouponReason::AlreadyRedeemed,
            format!("Coupon '{}' has already been used", coupon.code),
        ));
    }
    Ok(coupon)
}

/// Marks a pending order paid once the payment provider confirms it.
pub async fn finalize_order(db: &DbState, order_id: &str) -> Result<Order, ApiError> {
    debug!(order_id = %order_id, "finalize_order command");
    Ok(db.inner().orders().finalize_order(order_id, Utc::now()).await?)
}

pub async fn cancel_order(db: &DbState, order_id: &str) -> Result<(), ApiError> {
    debug!(order_id = %order_id, "cancel_order command");
    Ok(db.inner().orders().cancel_order(order_id, Utc::now()).await?)
}

/// A user's orders, newest first.
pub async fn list_orders(db: &DbState, user_id: &str) -> Result<Vec<Order>, ApiError> {
    debug!(user_id = %user_id, "list_orders command");
    Ok(db.inner().orders().list_for_user(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_meal_lines, MealRequest};
    use crate::commands::coupon::apply_coupon;
    use crate::commands::fixtures::{day, seeded, PARENT};
    use crate::error::ErrorCode;
    use lunchbox_core::OrderStatus;

    async fn fill_cart(db: &DbState, cart: &CartState, config: &ConfigState, dates: &[i64]) {
        let req = MealRequest {
            main_id: "wrap".into(),
            add_on_ids: Vec::new(),
            side_id: None,
            fruit_id: None,
            child_ids: vec!["zoe".into()],
            dates: dates.iter().map(|d| day(*d)).collect(),
        };
        add_meal_lines(db, cart, config, &req).await.unwrap();
    }

    #[tokio::test]
    async fn test_checkout_creates_pending_order_and_clears_cart() {
        let (db, cart, config) = seeded().await;
        fill_cart(&db, &cart, &config, &[1, 2]).await;
        apply_coupon(&db, &cart, &config, "TEN").await.unwrap();

        let resp = checkout(&db, &cart, &config, PARENT).await.unwrap();

        // $20.00 - 5% = $19.00, - 10% = $17.10
        assert_eq!(resp.meal_count, 2);
        assert_eq!(resp.subtotal_cents, 2000);
        assert_eq!(resp.bundle_discount_cents, 100);
        assert_eq!(resp.coupon_discount_cents, 190);
        assert_eq!(resp.final_total_cents, 1710);
        assert_eq!(resp.final_total_display, "$17.10");
        assert!(cart.with_session(|s| s.cart.is_empty() && s.coupon.is_none()));

        let orders = list_orders(&db, PARENT).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::PendingPayment);
        assert_eq!(orders[0].coupon_code.as_deref(), Some("TEN"));
    }

    #[tokio::test]
    async fn test_empty_cart_blocked() {
        let (db, cart, config) = seeded().await;

        let err = checkout(&db, &cart, &config, PARENT).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_single_use_coupon_once_per_user() {
        let (db, cart, config) = seeded().await;

        fill_cart(&db, &cart, &config, &[1]).await;
        apply_coupon(&db, &cart, &config, "FIVE").await.unwrap();
        let first = checkout(&db, &cart, &config, PARENT).await.unwrap();
        let paid = finalize_order(&db, &first.order_id).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);

        let coupon = db.inner().coupons().get_by_code("FIVE").await.unwrap().unwrap();
        assert_eq!(coupon.use_count, 1);

        // Applying still works; checkout catches the reuse
        fill_cart(&db, &cart, &config, &[2]).await;
        apply_coupon(&db, &cart, &config, "FIVE").await.unwrap();
        let err = checkout(&db, &cart, &config, PARENT).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponError);
        assert_eq!(err.reason, Some(CouponReason::AlreadyRedeemed));
        assert!(cart.with_session(|s| s.coupon.is_none() && !s.cart.is_empty()));

        // Another parent can still use it
        apply_coupon(&db, &cart, &config, "FIVE").await.unwrap();
        let other = checkout(&db, &cart, &config, "parent-2").await.unwrap();
        finalize_order(&db, &other.order_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_finalize_rejects_second_pending_order_with_same_coupon() {
        let (db, cart, config) = seeded().await;

        fill_cart(&db, &cart, &config, &[1]).await;
        apply_coupon(&db, &cart, &config, "FIVE").await.unwrap();
        let first = checkout(&db, &cart, &config, PARENT).await.unwrap();

        fill_cart(&db, &cart, &config, &[2]).await;
        apply_coupon(&db, &cart, &config, "FIVE").await.unwrap();
        let second = checkout(&db, &cart, &config, PARENT).await.unwrap();

        finalize_order(&db, &first.order_id).await.unwrap();
        let err = finalize_order(&db, &second.order_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CouponError);

        let order = db.inner().orders().get_by_id(&second.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
    }

    #[tokio::test]
    async fn test_cancel_only_pending() {
        let (db, cart, config) = seeded().await;
        fill_cart(&db, &cart, &config, &[1]).await;
        let resp = checkout(&db, &cart, &config, PARENT).await.unwrap();

        cancel_order(&db, &resp.order_id).await.unwrap();

        let err = cancel_order(&db, &resp.order_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        let err = finalize_order(&db, &resp.order_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
