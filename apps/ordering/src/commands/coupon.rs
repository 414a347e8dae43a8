//! # Coupon Commands
//!
//! Applying a coupon to the cart, plus coupon administration.
//!
//! A code that fails lookup or validation leaves the cart on bundle-only
//! pricing: any previously applied coupon is dropped along with the error.
//! Single-use redemption is checked again, authoritatively, when the order
//! is finalized.

use chrono::Utc;
use tracing::{debug, info, warn};

use lunchbox_core::validation::validate_coupon_record;
use lunchbox_core::{check_coupon, Coupon};

use crate::commands::cart::CartResponse;
use crate::error::ApiError;
use crate::state::{CartState, ConfigState, DbState};

/// Looks up `code` (exact, case-sensitive) and applies it to the cart.
pub async fn apply_coupon(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    code: &str,
) -> Result<CartResponse, ApiError> {
    debug!(code = %code, "apply_coupon command");

    match lookup_valid_coupon(db, code).await {
        Ok(coupon) => {
            info!(code = %coupon.code, "Coupon applied");
            Ok(cart.with_session_mut(|session| {
                session.coupon = Some(coupon);
                CartResponse::from_session(session, config)
            }))
        }
        Err(err) => {
            warn!(code = %code, "Coupon rejected: {}", err.message);
            cart.with_session_mut(|session| session.coupon = None);
            Err(err)
        }
    }
}

/// Fetches a coupon that is valid right now.
///
/// Code format is only enforced when coupons are created; a code typed by a
/// parent that matches nothing is simply not found.
pub(crate) async fn lookup_valid_coupon(db: &DbState, code: &str) -> Result<Coupon, ApiError> {
    let candidate = db.inner().coupons().get_by_code(code).await?;
    Ok(check_coupon(candidate, code, Utc::now())?)
}

pub fn remove_coupon(cart: &CartState, config: &ConfigState) -> CartResponse {
    debug!("remove_coupon command");

    cart.with_session_mut(|session| {
        session.coupon = None;
        CartResponse::from_session(session, config)
    })
}

/// Admin: lists every coupon, soonest expiry first.
pub async fn list_coupons(db: &DbState) -> Result<Vec<Coupon>, ApiError> {
    debug!("list_coupons command");
    Ok(db.inner().coupons().list().await?)
}

/// Admin: creates a coupon after field validation.
pub async fn create_coupon(db: &DbState, coupon: &Coupon) -> Result<(), ApiError> {
    debug!(code = %coupon.code, "create_coupon command");

    validate_coupon_record(coupon)?;
    db.inner().coupons().insert(coupon).await?;

    info!(code = %coupon.code, "Coupon created");
    Ok(())
}

/// Admin: edits a coupon's terms. The redemption count is not editable.
pub async fn update_coupon(db: &DbState, coupon: &Coupon) -> Result<(), ApiError> {
    debug!(id = %coupon.id, "update_coupon command");

    validate_coupon_record(coupon)?;
    Ok(db.inner().coupons().update(coupon).await?)
}

pub async fn set_coupon_active(db: &DbState, id: &str, is_active: bool) -> Result<(), ApiError> {
    debug!(id = %id, is_active, "set_coupon_active command");
    Ok(db.inner().coupons().set_active(id, is_active).await?)
}
