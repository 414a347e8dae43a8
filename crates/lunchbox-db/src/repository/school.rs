//! # School Repository
//!
//! Schools, their delivery calendars and the children enrolled at them.
//!
//! A school with `has_calendar = 0` delivers on every weekday. With
//! `has_calendar = 1` only the days in `school_valid_dates` are open; an
//! empty list then means no delivery day at all.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lunchbox_core::{Child, School};

/// Repository for schools and children.
#[derive(Debug, Clone)]
pub struct SchoolRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct SchoolRow {
    id: String,
    name: String,
    is_active: bool,
    has_calendar: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct CalendarRow {
    school_id: String,
    date: NaiveDate,
}

#[derive(Debug, sqlx::FromRow)]
struct ChildRow {
    id: String,
    parent_id: String,
    name: String,
    school_id: String,
    class_name: Option<String>,
}

impl From<ChildRow> for Child {
    fn from(row: ChildRow) -> Self {
        Child {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            school_id: row.school_id,
            class_name: row.class_name,
        }
    }
}

impl SchoolRepository {
    /// Creates a new SchoolRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SchoolRepository { pool }
    }

    /// Lists all schools, sorted by name, with their calendars.
    pub async fn list(&self) -> DbResult<Vec<School>> {
        let rows: Vec<SchoolRow> =
            sqlx::query_as("SELECT id, name, is_active, has_calendar FROM schools ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;

        let calendar: Vec<CalendarRow> =
            sqlx::query_as("SELECT school_id, date FROM school_valid_dates")
                .fetch_all(&self.pool)
                .await?;

        let mut dates: HashMap<String, BTreeSet<NaiveDate>> = HashMap::new();
        for row in calendar {
            dates.entry(row.school_id).or_default().insert(row.date);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let valid_dates = row
                    .has_calendar
                    .then(|| dates.remove(&row.id).unwrap_or_default());
                School {
                    id: row.id,
                    name: row.name,
                    is_active: row.is_active,
                    valid_dates,
                }
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<School>> {
        let row: Option<SchoolRow> =
            sqlx::query_as("SELECT id, name, is_active, has_calendar FROM schools WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let valid_dates = if row.has_calendar {
            let dates: Vec<NaiveDate> =
                sqlx::query_scalar("SELECT date FROM school_valid_dates WHERE school_id = ?1")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?;
            Some(dates.into_iter().collect())
        } else {
            None
        };

        Ok(Some(School {
            id: row.id,
            name: row.name,
            is_active: row.is_active,
            valid_dates,
        }))
    }

    /// Inserts or replaces a school and its calendar.
    pub async fn upsert(&self, school: &School) -> DbResult<()> {
        debug!(id = %school.id, name = %school.name, "Upserting school");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO schools (id, name, is_active, has_calendar, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                is_active = excluded.is_active,
                has_calendar = excluded.has_calendar,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&school.id)
        .bind(&school.name)
        .bind(school.is_active)
        .bind(school.valid_dates.is_some())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM school_valid_dates WHERE school_id = ?1")
            .bind(&school.id)
            .execute(&mut *tx)
            .await?;

        for date in school.valid_dates.iter().flatten() {
            sqlx::query("INSERT INTO school_valid_dates (school_id, date) VALUES (?1, ?2)")
                .bind(&school.id)
                .bind(date)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Lists a parent's children, sorted by name.
    pub async fn children_of(&self, parent_id: &str) -> DbResult<Vec<Child>> {
        let rows: Vec<ChildRow> = sqlx::query_as(
            r#"
            SELECT id, parent_id, name, school_id, class_name
            FROM children
            WHERE parent_id = ?1
            ORDER BY name, id
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Child::from).collect())
    }

    pub async fn get_child(&self, id: &str) -> DbResult<Option<Child>> {
        let row: Option<ChildRow> = sqlx::query_as(
            "SELECT id, parent_id, name, school_id, class_name FROM children WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Child::from))
    }

    /// Adds a child. The school must exist.
    pub async fn insert_child(&self, child: &Child) -> DbResult<()> {
        debug!(id = %child.id, school_id = %child.school_id, "Inserting child");

        sqlx::query(
            r#"
            INSERT INTO children (id, parent_id, name, school_id, class_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&child.id)
        .bind(&child.parent_id)
        .bind(&child.name)
        .bind(&child.school_id)
        .bind(&child.class_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_child(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM children WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Child", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn school(id: &str, name: &str, valid_dates: Option<BTreeSet<NaiveDate>>) -> School {
        School {
            id: id.to_string(),
            name: name.to_string(),
            is_active: true,
            valid_dates,
        }
    }

    fn child(id: &str, name: &str, school_id: &str) -> Child {
        Child {
            id: id.to_string(),
            parent_id: "parent-1".to_string(),
            name: name.to_string(),
            school_id: school_id.to_string(),
            class_name: Some("2A".to_string()),
        }
    }

    #[tokio::test]
    async fn test_calendar_none_vs_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.schools();

        repo.upsert(&school("s1", "Open Weekdays", None)).await.unwrap();
        repo.upsert(&school("s2", "Closed", Some(BTreeSet::new())))
            .await
            .unwrap();

        let open = repo.get_by_id("s1").await.unwrap().unwrap();
        assert_eq!(open.valid_dates, None);

        let closed = repo.get_by_id("s2").await.unwrap().unwrap();
        assert_eq!(closed.valid_dates, Some(BTreeSet::new()));

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Closed", "Open Weekdays"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_calendar() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.schools();
        let d1 = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();

        repo.upsert(&school("s1", "Northside", Some([d1, d2].into_iter().collect())))
            .await
            .unwrap();
        repo.upsert(&school("s1", "Northside", Some([d2].into_iter().collect())))
            .await
            .unwrap();

        let stored = repo.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].valid_dates, Some([d2].into_iter().collect()));
    }

    #[tokio::test]
    async fn test_children() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.schools();
        repo.upsert(&school("s1", "Northside", None)).await.unwrap();

        repo.insert_child(&child("c2", "Zoe", "s1")).await.unwrap();
        repo.insert_child(&child("c1", "Adam", "s1")).await.unwrap();

        let names: Vec<_> = repo
            .children_of("parent-1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Adam", "Zoe"]);
        assert!(repo.children_of("parent-2").await.unwrap().is_empty());

        repo.delete_child("c1").await.unwrap();
        assert!(repo.get_child("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_child_requires_school() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let result = db.schools().insert_child(&child("c1", "Adam", "nope")).await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }
}
