//! # Error Types
//!
//! Domain-specific error types for lunchbox-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lunchbox-core errors (this file)                                      │
//! │  ├── CoreError        - Cart and order failures, wraps the rest        │
//! │  ├── ValidationError  - Meal line cannot enter the cart                │
//! │  ├── CouponError      - Coupon cannot be applied right now             │
//! │  └── FieldError       - Admin input validation failures                │
//! │                                                                         │
//! │  lunchbox-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Ordering app errors                                                   │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is user-correctable. None of them is raised by the pricing
//! math itself: `compute_totals` is total over well-formed input.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::order::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and order errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No line with this id is in the cart.
    #[error("Meal line not found: {0}")]
    LineNotFound(String),

    /// Cart has reached its line limit.
    #[error("Cart cannot have more than {max} meals")]
    CartTooLarge { max: usize },

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Order status cannot move from `from` to `to`.
    #[error("Order cannot go from {from} to {to}")]
    InvalidStatusTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Meal line construction rule violated.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Coupon rejected.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Admin input rejected.
    #[error("Invalid input: {0}")]
    Field(#[from] FieldError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Reasons a meal line may not be added to the cart.
///
/// ## User Workflow
/// ```text
/// Order dialog ──► Add to cart
///                      │
///                      ▼
///              MealLineBuilder::build()
///                      │
///          ┌───────────┴───────────┐
///          ▼                       ▼
///   Ok(lines) → cart        Err(MissingSide) → toast, cart unchanged
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a main dish")]
    MissingMain,

    #[error("Please select at least one child")]
    MissingChild,

    #[error("Please select at least one delivery date")]
    MissingDate,

    /// The child's school is not in the catalog.
    #[error("No school found for {child_name}")]
    MissingSchool { child_name: String },

    #[error("Please select a side")]
    MissingSide,

    #[error("Please select a fruit")]
    MissingFruit,

    /// Add-on is not offered with the selected main.
    #[error("{add_on} is not available with {main}")]
    IncompatibleAddOn { main: String, add_on: String },

    /// Side or fruit picked while a main-only add-on is selected.
    #[error("Sides and fruit are not included with a main-only meal")]
    SidesExcluded,

    /// Date no longer eligible for a selected child's school.
    #[error("{date} is not available for delivery")]
    IneligibleDate { date: NaiveDate },
}

// =============================================================================
// Coupon Error
// =============================================================================

/// Reasons a coupon code may not be applied.
///
/// When any of these occurs the cart falls back to bundle-only pricing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Coupon '{code}' not found")]
    CouponNotFound { code: String },

    #[error("Coupon '{code}' expired on {expired_at}")]
    ExpiredCoupon {
        code: String,
        expired_at: DateTime<Utc>,
    },

    #[error("Coupon '{code}' is no longer active")]
    InactiveCoupon { code: String },
}

// =============================================================================
// Field Error
// =============================================================================

/// Input validation errors for admin-managed records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
