//! # Database Errors
//!
//! Error types for lunchbox-db operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sqlx::Error ──► From<sqlx::Error> ──► DbError ──► ApiError (app)      │
//! │                                                                         │
//! │  RowNotFound        → NotFound                                         │
//! │  UNIQUE failed      → UniqueViolation                                  │
//! │  FOREIGN KEY failed → ForeignKeyViolation                              │
//! │  PoolTimedOut       → PoolExhausted                                    │
//! │                                                                         │
//! │  Raised directly by repositories:                                      │
//! │  CouponAlreadyRedeemed (order finalization)                            │
//! │  InvalidData (a stored value that no longer parses)                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    /// - Status guard in an UPDATE matched nothing
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (e.g. duplicate coupon code).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Child enrolled at a school that doesn't exist
    /// - Order referencing an unknown coupon
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The user already redeemed this single-use coupon on a paid order.
    #[error("Coupon '{code}' has already been used")]
    CouponAlreadyRedeemed { code: String },

    /// A stored value could not be decoded.
    #[error("Invalid {field} in database: {reason}")]
    InvalidData { field: String, reason: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn invalid_data(field: impl Into<String>, reason: impl ToString) -> Self {
        DbError::InvalidData {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                // and "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::invalid_data("json column", err)
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_pool_timeout_maps_to_exhausted() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::PoolExhausted));
    }

    #[test]
    fn test_coupon_already_redeemed_message() {
        let err = DbError::CouponAlreadyRedeemed {
            code: "WELCOME".to_string(),
        };
        assert_eq!(err.to_string(), "Coupon 'WELCOME' has already been used");
    }
}
