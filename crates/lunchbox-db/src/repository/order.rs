//! # Order Repository
//!
//! Persistence for checked-out orders and their frozen lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CHECKOUT                                                           │
//! │     └── insert_order() → orders + order_lines  { pending_payment }     │
//! │                                                                         │
//! │  2. PAYMENT CONFIRMED                                                  │
//! │     └── finalize_order() in ONE transaction:                           │
//! │         ├── orders.status = 'paid'                                     │
//! │         ├── single-use coupon already redeemed by user? → abort        │
//! │         ├── coupons.use_count += 1                                     │
//! │         └── INSERT coupon_redemptions                                  │
//! │                                                                         │
//! │  3. (OPTIONAL) ABANDONED                                               │
//! │     └── cancel_order() → { cancelled }                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lunchbox_core::{Order, OrderLine, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    status: OrderStatus,
    subtotal_cents: i64,
    bundle_discount_bps: u32,
    bundle_discount_cents: i64,
    coupon_discount_cents: i64,
    final_total_cents: i64,
    coupon_id: Option<String>,
    coupon_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            lines,
            subtotal_cents: self.subtotal_cents,
            bundle_discount_bps: self.bundle_discount_bps,
            bundle_discount_cents: self.bundle_discount_cents,
            coupon_discount_cents: self.coupon_discount_cents,
            final_total_cents: self.final_total_cents,
            coupon_id: self.coupon_id,
            coupon_code: self.coupon_code,
            created_at: self.created_at,
            updated_at: self.updated_at,
            paid_at: self.paid_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: String,
    main_id: String,
    main_name: String,
    add_on_names: String,
    side_name: Option<String>,
    side_code: Option<String>,
    fruit_name: Option<String>,
    fruit_code: Option<String>,
    child_id: String,
    child_name: String,
    class_name: Option<String>,
    school_id: String,
    school_name: String,
    delivery_date: NaiveDate,
    line_total_cents: i64,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = DbError;

    fn try_from(row: OrderLineRow) -> DbResult<Self> {
        Ok(OrderLine {
            add_on_names: serde_json::from_str(&row.add_on_names)?,
            id: row.id,
            main_id: row.main_id,
            main_name: row.main_name,
            side_name: row.side_name,
            side_code: row.side_code,
            fruit_name: row.fruit_name,
            fruit_code: row.fruit_code,
            child_id: row.child_id,
            child_name: row.child_name,
            class_name: row.class_name,
            school_id: row.school_id,
            school_name: row.school_name,
            delivery_date: row.delivery_date,
            line_total_cents: row.line_total_cents,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RedemptionCheckRow {
    user_id: String,
    coupon_id: Option<String>,
    coupon_code: Option<String>,
}

const SELECT_ORDERS: &str = r#"
    SELECT
        id, user_id, status,
        subtotal_cents, bundle_discount_bps, bundle_discount_cents,
        coupon_discount_cents, final_total_cents,
        coupon_id, coupon_code,
        created_at, updated_at, paid_at
    FROM orders
"#;

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a pending order and its lines in one transaction.
    pub async fn insert_order(&self, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            user_id = %order.user_id,
            lines = order.lines.len(),
            total_cents = order.final_total_cents,
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, status,
                subtotal_cents, bundle_discount_bps, bundle_discount_cents,
                coupon_discount_cents, final_total_cents,
                coupon_id, coupon_code,
                created_at, updated_at, paid_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10,
                ?11, ?12, ?13
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.bundle_discount_bps)
        .bind(order.bundle_discount_cents)
        .bind(order.coupon_discount_cents)
        .bind(order.final_total_cents)
        .bind(&order.coupon_id)
        .bind(&order.coupon_code)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    id, order_id, position,
                    main_id, main_name, add_on_names,
                    side_name, side_code, fruit_name, fruit_code,
                    child_id, child_name, class_name,
                    school_id, school_name,
                    delivery_date, line_total_cents
                ) VALUES (
                    ?1, ?2, ?3,
                    ?4, ?5, ?6,
                    ?7, ?8, ?9, ?10,
                    ?11, ?12, ?13,
                    ?14, ?15,
                    ?16, ?17
                )
                "#,
            )
            .bind(&line.id)
            .bind(&order.id)
            .bind(position as i64)
            .bind(&line.main_id)
            .bind(&line.main_name)
            .bind(serde_json::to_string(&line.add_on_names)?)
            .bind(&line.side_name)
            .bind(&line.side_code)
            .bind(&line.fruit_name)
            .bind(&line.fruit_code)
            .bind(&line.child_id)
            .bind(&line.child_name)
            .bind(&line.class_name)
            .bind(&line.school_id)
            .bind(&line.school_name)
            .bind(line.delivery_date)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets an order with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_ORDERS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.get_lines(&row.id).await?;
                Ok(Some(row.into_order(lines)))
            }
            None => Ok(None),
        }
    }

    /// A user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = ?1 ORDER BY created_at DESC, id",
            SELECT_ORDERS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_lines(rows).await
    }

    /// Paid orders with at least one meal delivered on `date`.
    ///
    /// Orders are returned whole; the run sheet picks the lines for the day.
    pub async fn list_paid_for_date(&self, date: NaiveDate) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"{}
            WHERE status = 'paid'
              AND id IN (SELECT order_id FROM order_lines WHERE delivery_date = ?1)
            ORDER BY created_at, id
            "#,
            SELECT_ORDERS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        self.with_lines(rows).await
    }

    /// Lines of an order, in cart order.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(
            r#"
            SELECT
                id, main_id, main_name, add_on_names,
                side_name, side_code, fruit_name, fruit_code,
                child_id, child_name, class_name,
                school_id, school_name,
                delivery_date, line_total_cents
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OrderLine::try_from).collect()
    }

    async fn with_lines(&self, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.get_lines(&row.id).await?;
            orders.push(row.into_order(lines));
        }
        Ok(orders)
    }

    /// Marks a pending order paid and books its coupon redemption.
    ///
    /// ## What This Does
    /// 1. Flips the order from `pending_payment` to `paid`
    /// 2. If a coupon was applied:
    ///    - single-use and already redeemed by this user → abort
    ///    - increment `coupons.use_count`
    ///    - record a `coupon_redemptions` row
    ///
    /// All of it commits together or not at all.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no pending order with this ID
    /// * `DbError::CouponAlreadyRedeemed` - single-use coupon reused
    pub async fn finalize_order(&self, order_id: &str, now: DateTime<Utc>) -> DbResult<Order> {
        debug!(id = %order_id, "Finalizing order");

        let mut tx = self.pool.begin().await?;

        // The guarded UPDATE goes first so the write lock is held for the
        // rest of the bookkeeping.
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'paid',
                paid_at = ?2,
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending_payment'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending)", order_id));
        }

        let check: RedemptionCheckRow =
            sqlx::query_as("SELECT user_id, coupon_id, coupon_code FROM orders WHERE id = ?1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;

        if let Some(coupon_id) = &check.coupon_id {
            let is_single_use =
                sqlx::query_scalar::<_, bool>("SELECT is_single_use FROM coupons WHERE id = ?1")
                    .bind(coupon_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| DbError::not_found("Coupon", coupon_id))?;

            if is_single_use {
                let redeemed: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM coupon_redemptions WHERE coupon_id = ?1 AND user_id = ?2",
                )
                .bind(coupon_id)
                .bind(&check.user_id)
                .fetch_one(&mut *tx)
                .await?;

                if redeemed > 0 {
                    let code = check.coupon_code.clone().unwrap_or_default();
                    warn!(order_id = %order_id, code = %code, "Single-use coupon already redeemed");
                    return Err(DbError::CouponAlreadyRedeemed { code });
                }
            }

            sqlx::query("UPDATE coupons SET use_count = use_count + 1, updated_at = ?2 WHERE id = ?1")
                .bind(coupon_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO coupon_redemptions (id, coupon_id, user_id, order_id, redeemed_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(coupon_id)
            .bind(&check.user_id)
            .bind(order_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(id = %order_id, coupon = ?check.coupon_code, "Order paid");

        self.get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    /// Cancels a pending order. Paid orders cannot be cancelled.
    pub async fn cancel_order(&self, order_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %order_id, "Cancelling order");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending_payment'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending)", order_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
