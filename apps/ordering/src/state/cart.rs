//! # Cart State
//!
//! The parent's working cart plus the coupon applied to it.
//!
//! ## Why one mutex?
//! The coupon is priced against the cart's current meal count, so the two
//! change together: clearing the cart also drops the coupon.

use std::sync::{Arc, Mutex};

use lunchbox_core::{compute_totals, Cart, Coupon, PricingResult};

/// Cart contents and the currently applied coupon.
#[derive(Debug, Clone, Default)]
pub struct CartSession {
    pub cart: Cart,
    pub coupon: Option<Coupon>,
}

impl CartSession {
    /// Prices the cart with the applied coupon, if any.
    pub fn pricing(&self) -> PricingResult {
        compute_totals(&self.cart, self.coupon.as_ref())
    }

    /// Empties the cart and removes the coupon.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.coupon = None;
    }
}

/// Thread-safe cart state.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    session: Arc<Mutex<CartSession>>,
}

impl CartState {
    pub fn new() -> Self {
        CartState::default()
    }

    /// Runs `f` with read access to the session.
    ///
    /// A poisoned lock is recovered: every session mutation leaves the cart
    /// consistent, so the data behind it is still usable.
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CartSession) -> R,
    {
        let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        f(&session)
    }

    /// Runs `f` with write access to the session.
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CartSession) -> R,
    {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lunchbox_core::DiscountType;
    use rust_decimal::Decimal;

    #[test]
    fn test_reset_drops_coupon() {
        let state = CartState::new();
        state.with_session_mut(|s| {
            s.coupon = Some(Coupon {
                id: "c1".into(),
                code: "TAKE5".into(),
                discount_type: DiscountType::Fixed,
                discount_amount: Decimal::from(5),
                expiry_date: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                is_single_use: false,
                is_active: true,
                use_count: 0,
            });
        });
        assert!(state.with_session(|s| s.coupon.is_some()));

        state.with_session_mut(CartSession::reset);
        assert!(state.with_session(|s| s.coupon.is_none() && s.cart.is_empty()));
    }

    #[test]
    fn test_empty_session_prices_to_zero() {
        let state = CartState::new();
        let pricing = state.with_session(CartSession::pricing);

        assert_eq!(pricing.meal_count, 0);
        assert!(pricing.final_total.is_zero());
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let state = CartState::new();
        let clone = state.clone();
        let _ = std::thread::spawn(move || {
            clone.with_session_mut(|_| panic!("boom"));
        })
        .join();

        assert!(state.with_session(|s| s.cart.is_empty()));
    }
}
