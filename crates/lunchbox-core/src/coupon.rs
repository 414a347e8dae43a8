//! # Coupon Validation
//!
//! Decides whether a code typed at checkout may be applied right now.
//!
//! ```text
//! code ──► CouponLookup::find_coupon ──► None ──────────► CouponNotFound
//!                      │
//!                      ▼ Some(coupon)
//!          expiry_date < now ? ──────────────────────────► ExpiredCoupon
//!                      │
//!          !is_active ? ─────────────────────────────────► InactiveCoupon
//!                      │
//!                      ▼
//!                  Ok(coupon)
//! ```
//!
//! Single-use coupons are not checked here. Whether a user already
//! redeemed one is only known to order finalization in the database layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::CouponError;
use crate::types::Coupon;

/// Keyed lookup of coupons by exact, case-sensitive code.
///
/// Implemented for in-memory collections here. The database layer fetches
/// the single candidate and hands it to [`check_coupon`].
pub trait CouponLookup {
    fn find_coupon(&self, code: &str) -> Option<&Coupon>;
}

impl CouponLookup for [Coupon] {
    fn find_coupon(&self, code: &str) -> Option<&Coupon> {
        self.iter().find(|c| c.code == code)
    }
}

impl CouponLookup for Vec<Coupon> {
    fn find_coupon(&self, code: &str) -> Option<&Coupon> {
        self.as_slice().find_coupon(code)
    }
}

/// Keyed by coupon code.
impl CouponLookup for HashMap<String, Coupon> {
    fn find_coupon(&self, code: &str) -> Option<&Coupon> {
        self.get(code)
    }
}

/// Looks up `code` and checks it may be applied at `now`.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use lunchbox_core::coupon::validate_coupon;
/// use lunchbox_core::{Coupon, CouponError, DiscountType};
/// use rust_decimal::Decimal;
///
/// let now = Utc::now();
/// let coupons = vec![Coupon {
///     id: "1".into(),
///     code: "SPRING10".into(),
///     discount_type: DiscountType::Percentage,
///     discount_amount: Decimal::from(10),
///     expiry_date: now + Duration::days(30),
///     is_single_use: false,
///     is_active: true,
///     use_count: 0,
/// }];
///
/// assert!(validate_coupon(&coupons, "SPRING10", now).is_ok());
/// assert!(matches!(
///     validate_coupon(&coupons, "spring10", now),
///     Err(CouponError::CouponNotFound { .. })
/// ));
/// ```
pub fn validate_coupon<'a, L>(
    lookup: &'a L,
    code: &str,
    now: DateTime<Utc>,
) -> Result<&'a Coupon, CouponError>
where
    L: CouponLookup + ?Sized,
{
    check_coupon(lookup.find_coupon(code), code, now)
}

/// Checks an already-fetched candidate for `code`.
pub fn check_coupon<C>(candidate: Option<C>, code: &str, now: DateTime<Utc>) -> Result<C, CouponError>
where
    C: std::borrow::Borrow<Coupon>,
{
    let coupon = candidate.ok_or_else(|| CouponError::CouponNotFound {
        code: code.to_string(),
    })?;

    let c = coupon.borrow();
    if c.expiry_date < now {
        return Err(CouponError::ExpiredCoupon {
            code: c.code.clone(),
            expired_at: c.expiry_date,
        });
    }

    if !c.is_active {
        return Err(CouponError::InactiveCoupon {
            code: c.code.clone(),
        });
    }

    Ok(coupon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountType;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn coupon(code: &str, expires_in_days: i64, active: bool) -> Coupon {
        Coupon {
            id: format!("id-{}", code),
            code: code.to_string(),
            discount_type: DiscountType::Fixed,
            discount_amount: Decimal::from(5),
            expiry_date: now() + Duration::days(expires_in_days),
            is_single_use: true,
            is_active: active,
            use_count: 3,
        }
    }

    fn coupons() -> Vec<Coupon> {
        vec![
            coupon("VALID", 10, true),
            coupon("OLD", -1, true),
            coupon("OFF", 10, false),
            coupon("OLDOFF", -1, false),
        ]
    }

    #[test]
    fn test_valid_coupon() {
        let coupons = coupons();
        let found = validate_coupon(&coupons, "VALID", now()).unwrap();
        assert_eq!(found.code, "VALID");
    }

    #[test]
    fn test_single_use_not_checked() {
        // use_count > 0 on a single-use coupon is still valid here
        let coupons = coupons();
        assert!(validate_coupon(&coupons, "VALID", now()).is_ok());
    }

    #[test]
    fn test_not_found_is_case_sensitive() {
        let coupons = coupons();
        assert_eq!(
            validate_coupon(&coupons, "valid", now()).unwrap_err(),
            CouponError::CouponNotFound {
                code: "valid".to_string()
            }
        );
    }

    #[test]
    fn test_expired() {
        let coupons = coupons();
        let err = validate_coupon(&coupons, "OLD", now()).unwrap_err();
        assert!(matches!(err, CouponError::ExpiredCoupon { .. }));
    }

    #[test]
    fn test_expiry_is_checked_before_active_flag() {
        let coupons = coupons();
        let err = validate_coupon(&coupons, "OLDOFF", now()).unwrap_err();
        assert!(matches!(err, CouponError::ExpiredCoupon { .. }));
    }

    #[test]
    fn test_inactive() {
        let coupons = coupons();
        let err = validate_coupon(&coupons, "OFF", now()).unwrap_err();
        assert!(matches!(err, CouponError::InactiveCoupon { .. }));
    }

    #[test]
    fn test_expiring_exactly_now_is_valid() {
        let mut c = coupon("EDGE", 0, true);
        c.expiry_date = now();
        assert!(check_coupon(Some(&c), "EDGE", now()).is_ok());
    }

    #[test]
    fn test_hashmap_lookup() {
        let map: HashMap<String, Coupon> = coupons()
            .into_iter()
            .map(|c| (c.code.clone(), c))
            .collect();
        assert!(validate_coupon(&map, "VALID", now()).is_ok());
        assert!(validate_coupon(&map, "NOPE", now()).is_err());
    }

    #[test]
    fn test_check_owned_candidate() {
        let c = coupon("OWNED", 1, true);
        let checked: Coupon = check_coupon(Some(c), "OWNED", now()).unwrap();
        assert_eq!(checked.code, "OWNED");

        let missing: Result<Coupon, _> = check_coupon(None, "OWNED", now());
        assert!(missing.is_err());
    }
}
