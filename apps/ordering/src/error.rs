//! # API Error Type
//!
//! Unified error type for ordering commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command Function ── Result<T, ApiError>                                │
//! │         │                                                               │
//! │         ├── DbError ─────────────┐                                      │
//! │         ├── CoreError ───────────┤                                      │
//! │         ├── ValidationError ─────┼──► ApiError { code, message }        │
//! │         ├── CouponError ─────────┤                                      │
//! │         └── FieldError ──────────┘                                      │
//! │                                                                         │
//! │  Internal details (SQL text, pool state) are logged, never returned.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "COUPON_ERROR",
//!   "message": "Coupon 'SUMMER24' expired on 2024-08-31 23:59:59 UTC",
//!   "reason": "EXPIRED"
//! }
//! ```
//!
//! `reason` is present only on coupon errors.

use serde::Serialize;

use lunchbox_core::{CoreError, CouponError, FieldError, ValidationError};
use lunchbox_db::DbError;

/// API error returned from commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CouponReason>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input or meal-line validation failed
    ValidationError,

    /// Coupon missing, expired, inactive or already used
    CouponError,

    /// Cart operation failed
    CartError,

    /// Database operation failed
    DatabaseError,

    /// Business rule violated (e.g. finalizing a cancelled order)
    BusinessLogic,

    Internal,
}

/// Which coupon check failed, for errors with [`ErrorCode::CouponError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponReason {
    NotFound,
    Expired,
    Inactive,
    AlreadyRedeemed,
}

impl From<&CouponError> for CouponReason {
    fn from(err: &CouponError) -> Self {
        match err {
            CouponError::CouponNotFound { .. } => CouponReason::NotFound,
            CouponError::ExpiredCoupon { .. } => CouponReason::Expired,
            CouponError::InactiveCoupon { .. } => CouponReason::Inactive,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            reason: None,
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn coupon(reason: CouponReason, message: impl Into<String>) -> Self {
        ApiError {
            reason: Some(reason),
            ..ApiError::new(ErrorCode::CouponError, message)
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            err @ DbError::CouponAlreadyRedeemed { .. } => {
                ApiError::coupon(CouponReason::AlreadyRedeemed, err.to_string())
            }
            DbError::InvalidData { field, reason } => {
                tracing::error!(field = %field, "Stored value failed to decode: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, "Database contains invalid data")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CouponError> for ApiError {
    fn from(err: CouponError) -> Self {
        ApiError::coupon(CouponReason::from(&err), err.to_string())
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LineNotFound(id) => ApiError::not_found("Meal line", &id),
            err @ CoreError::CartTooLarge { .. } => ApiError::cart(err.to_string()),
            err @ CoreError::EmptyCart => ApiError::cart(err.to_string()),
            err @ CoreError::InvalidStatusTransition { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::Validation(e) => e.into(),
            CoreError::Coupon(e) => e.into(),
            CoreError::Field(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
