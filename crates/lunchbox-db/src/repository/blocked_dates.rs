//! # Blocked Date Repository
//!
//! Days the kitchen does not deliver (public holidays, closures).

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct BlockedDate {
    pub date: NaiveDate,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BlockedDateRepository {
    pool: SqlitePool,
}

impl BlockedDateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BlockedDateRepository { pool }
    }

    /// Lists blocked dates in ascending order.
    pub async fn list(&self) -> DbResult<Vec<BlockedDate>> {
        let rows = sqlx::query_as("SELECT date, reason FROM blocked_dates ORDER BY date")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Just the dates, as the eligibility rules consume them.
    pub async fn dates(&self) -> DbResult<BTreeSet<NaiveDate>> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar("SELECT date FROM blocked_dates")
            .fetch_all(&self.pool)
            .await?;
        Ok(dates.into_iter().collect())
    }

    /// Blocks a date. Blocking an already blocked date updates its reason.
    pub async fn add(&self, date: NaiveDate, reason: Option<&str>) -> DbResult<()> {
        debug!(date = %date, reason = ?reason, "Blocking delivery date");

        sqlx::query(
            r#"
            INSERT INTO blocked_dates (date, reason, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (date) DO UPDATE SET reason = excluded.reason
            "#,
        )
        .bind(date)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove(&self, date: NaiveDate) -> DbResult<()> {
        debug!(date = %date, "Unblocking delivery date");

        let result = sqlx::query("DELETE FROM blocked_dates WHERE date = ?1")
            .bind(date)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Blocked date", date.to_string()));
        }

        Ok(())
    }
}
