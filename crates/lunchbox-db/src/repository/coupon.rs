//! # Coupon Repository
//!
//! Coupon administration and lookups. Codes are matched exactly
//! (case-sensitive). `use_count` is only changed by order finalization,
//! see [`OrderRepository::finalize_order`](crate::OrderRepository::finalize_order).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lunchbox_core::{Coupon, DiscountType};

/// Repository for coupon database operations.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: String,
    code: String,
    discount_type: DiscountType,
    discount_amount: String,
    expiry_date: DateTime<Utc>,
    is_single_use: bool,
    is_active: bool,
    use_count: i64,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DbError;

    fn try_from(row: CouponRow) -> DbResult<Self> {
        let discount_amount = Decimal::from_str(&row.discount_amount)
            .map_err(|e| DbError::invalid_data("discount_amount", e))?;

        Ok(Coupon {
            id: row.id,
            code: row.code,
            discount_type: row.discount_type,
            discount_amount,
            expiry_date: row.expiry_date,
            is_single_use: row.is_single_use,
            is_active: row.is_active,
            use_count: row.use_count,
        })
    }
}

const SELECT_COUPONS: &str = r#"
    SELECT
        id, code, discount_type, discount_amount, expiry_date,
        is_single_use, is_active, use_count
    FROM coupons
"#;

impl CouponRepository {
    /// Creates a new CouponRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Finds a coupon by its exact code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        debug!(code = %code, "Looking up coupon");

        let row: Option<CouponRow> = sqlx::query_as(&format!("{} WHERE code = ?1", SELECT_COUPONS))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Coupon::try_from).transpose()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Coupon>> {
        let row: Option<CouponRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COUPONS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Coupon::try_from).transpose()
    }

    /// Lists all coupons, soonest expiry first.
    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let rows: Vec<CouponRow> =
            sqlx::query_as(&format!("{} ORDER BY expiry_date, code", SELECT_COUPONS))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Coupon::try_from).collect()
    }

    /// Creates a coupon.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the code is taken
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(id = %coupon.id, code = %coupon.code, "Inserting coupon");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_type, discount_amount, expiry_date,
                is_single_use, is_active, use_count, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?9
            )
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_amount.to_string())
        .bind(coupon.expiry_date)
        .bind(coupon.is_single_use)
        .bind(coupon.is_active)
        .bind(coupon.use_count)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { field, .. } if field.ends_with("code") => {
                    Err(DbError::duplicate("coupon code", coupon.code.clone()))
                }
                other => Err(other),
            },
        }
    }

    /// Edits a coupon's terms. `use_count` is left untouched.
    pub async fn update(&self, coupon: &Coupon) -> DbResult<()> {
        debug!(id = %coupon.id, code = %coupon.code, "Updating coupon");

        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                code = ?2,
                discount_type = ?3,
                discount_amount = ?4,
                expiry_date = ?5,
                is_single_use = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_amount.to_string())
        .bind(coupon.expiry_date)
        .bind(coupon.is_single_use)
        .bind(coupon.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", &coupon.id));
        }

        Ok(())
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        debug!(id = %id, is_active, "Setting coupon active flag");

        let result = sqlx::query("UPDATE coupons SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        Ok(())
    }

    /// Whether `user_id` has already redeemed this coupon on a paid order.
    pub async fn has_redeemed(&self, coupon_id: &str, user_id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coupon_redemptions WHERE coupon_id = ?1 AND user_id = ?2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;

    fn coupon(id: &str, code: &str) -> Coupon {
        Coupon {
            id: id.to_string(),
            code: code.to_string(),
            discount_type: DiscountType::Percentage,
            discount_amount: Decimal::new(125, 1),
            expiry_date: Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap(),
            is_single_use: false,
            is_active: true,
            use_count: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_exact_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&coupon("cp1", "Spring")).await.unwrap();

        let found = repo.get_by_code("Spring").await.unwrap().unwrap();
        assert_eq!(found, coupon("cp1", "Spring"));
        assert_eq!(found.discount_amount.to_string(), "12.5");

        assert!(repo.get_by_code("SPRING").await.unwrap().is_none());
        assert!(repo.get_by_code("spring").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&coupon("cp1", "TEN")).await.unwrap();

        let err = repo.insert(&coupon("cp2", "TEN")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::UniqueViolation { ref value, .. } if value == "TEN"
        ));
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&coupon("cp1", "TEN")).await.unwrap();

        let mut edited = coupon("cp1", "TEN");
        edited.discount_type = DiscountType::Fixed;
        edited.discount_amount = Decimal::from(5);
        edited.use_count = 99;
        repo.update(&edited).await.unwrap();
        repo.set_active("cp1", false).await.unwrap();

        let stored = repo.get_by_id("cp1").await.unwrap().unwrap();
        assert_eq!(stored.discount_type, DiscountType::Fixed);
        assert_eq!(stored.discount_amount, Decimal::from(5));
        assert!(!stored.is_active);
        assert_eq!(stored.use_count, 0);

        assert!(matches!(
            repo.update(&coupon("missing", "X")).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_and_unredeemed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.coupons();
        repo.insert(&coupon("cp1", "B")).await.unwrap();
        repo.insert(&coupon("cp2", "A")).await.unwrap();

        let codes: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert!(!repo.has_redeemed("cp1", "user-1").await.unwrap());
    }
}
