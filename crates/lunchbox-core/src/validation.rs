//! # Validation Module
//!
//! Input validation for admin-managed records: coupons, catalog items,
//! schools and children.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin frontend                                               │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate feedback                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command (Rust)                                               │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (coupon code)                                              │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lunchbox_core::validation::{validate_coupon_code, validate_discount};
//! use lunchbox_core::DiscountType;
//! use rust_decimal::Decimal;
//!
//! validate_coupon_code("SPRING-10").unwrap();
//! validate_discount(DiscountType::Percentage, Decimal::from(10)).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::error::FieldError;
use crate::money::Money;
use crate::types::{Coupon, DiscountType, MenuItem};
use crate::{MAX_CART_LINES, MAX_COUPON_CODE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, FieldError>;

const MAX_NAME_LEN: usize = 200;
const MAX_SHORT_CODE_LEN: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a coupon code.
///
/// ## Rules
/// - 1 to 32 characters
/// - Letters, digits, hyphens and underscores only
/// - Case is preserved; lookups are case-sensitive
///
/// ## Example
/// ```rust
/// use lunchbox_core::validation::validate_coupon_code;
///
/// assert!(validate_coupon_code("WELCOME_5").is_ok());
/// assert!(validate_coupon_code("").is_err());
/// assert!(validate_coupon_code("TEN OFF").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(FieldError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > MAX_COUPON_CODE_LEN {
        return Err(FieldError::TooLong {
            field: "code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(FieldError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (menu items, schools, children).
///
/// ## Rules
/// - Not blank
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(FieldError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(FieldError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a side/fruit label code: up to 8 letters or digits.
pub fn validate_short_code(code: &str) -> ValidationResult<()> {
    if code.chars().count() > MAX_SHORT_CODE_LEN {
        return Err(FieldError::TooLong {
            field: "short_code".to_string(),
            max: MAX_SHORT_CODE_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(FieldError::InvalidFormat {
            field: "short_code".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a coupon discount amount for its type.
///
/// ## Rules
/// - Percentage: 0 to 100 inclusive
/// - Fixed: strictly positive
///
/// ## Example
/// ```rust
/// use lunchbox_core::validation::validate_discount;
/// use lunchbox_core::DiscountType;
/// use rust_decimal::Decimal;
///
/// assert!(validate_discount(DiscountType::Percentage, Decimal::from(100)).is_ok());
/// assert!(validate_discount(DiscountType::Percentage, Decimal::from(101)).is_err());
/// assert!(validate_discount(DiscountType::Fixed, Decimal::ZERO).is_err());
/// ```
pub fn validate_discount(discount_type: DiscountType, amount: Decimal) -> ValidationResult<()> {
    match discount_type {
        DiscountType::Percentage => {
            if amount < Decimal::ZERO || amount > Decimal::ONE_HUNDRED {
                return Err(FieldError::OutOfRange {
                    field: "discount_amount".to_string(),
                    min: "0".to_string(),
                    max: "100".to_string(),
                });
            }
        }
        DiscountType::Fixed => {
            if amount <= Decimal::ZERO {
                return Err(FieldError::MustBePositive {
                    field: "discount_amount".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a catalog price.
///
/// Add-ons may be negative ("main only" discounts). Every other priced
/// kind must be zero or more.
pub fn validate_price(item: &MenuItem) -> ValidationResult<()> {
    let Some(price) = item.price() else {
        return Ok(());
    };

    if matches!(item, MenuItem::AddOn(_)) {
        return Ok(());
    }

    if price < Money::zero() {
        return Err(FieldError::OutOfRange {
            field: "price".to_string(),
            min: "0".to_string(),
            max: "any".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a coupon before it is created or edited.
pub fn validate_coupon_record(coupon: &Coupon) -> ValidationResult<()> {
    validate_coupon_code(&coupon.code)?;
    validate_discount(coupon.discount_type, coupon.discount_amount)?;

    if coupon.use_count < 0 {
        return Err(FieldError::OutOfRange {
            field: "use_count".to_string(),
            min: "0".to_string(),
            max: "any".to_string(),
        });
    }

    Ok(())
}

/// Validates a catalog item before it is saved.
pub fn validate_menu_item(item: &MenuItem) -> ValidationResult<()> {
    validate_name("name", item.name())?;
    validate_price(item)?;

    let short_code = match item {
        MenuItem::Side(s) => s.short_code.as_deref(),
        MenuItem::Fruit(f) => f.short_code.as_deref(),
        _ => None,
    };
    if let Some(code) = short_code {
        validate_short_code(code)?;
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Checks that `adding` more lines fit in a cart holding `current_lines`.
pub fn validate_cart_size(current_lines: usize, adding: usize) -> ValidationResult<()> {
    if current_lines + adding > MAX_CART_LINES {
        return Err(FieldError::OutOfRange {
            field: "cart lines".to_string(),
            min: "0".to_string(),
            max: MAX_CART_LINES.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use lunchbox_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(FieldError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| FieldError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
