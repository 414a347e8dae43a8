//! # lunchbox-core: Pure Business Logic for Lunchbox
//!
//! Everything that decides what a parent pays lives here, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lunchbox Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │   Menu ──► Order dialog ──► Cart drawer ──► Checkout            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                apps/ordering (commands)                         │   │
//! │  │   add_meal, apply_coupon, checkout, run_sheet ...               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ lunchbox-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐  │   │
//! │  │  │  money  │ │  cart   │ │ pricing │ │ coupon  │ │meal_line │  │   │
//! │  │  │  Money  │ │MealLine │ │ bundle  │ │validate │ │ builder  │  │   │
//! │  │  │  Rate   │ │  Cart   │ │ totals  │ │ lookup  │ │  dates   │  │   │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                lunchbox-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Decimal `Money` and basis-point `DiscountRate`
//! - [`types`] - Catalog (`MenuItem` tagged union), schools, children, coupons
//! - [`cart`] - `MealLine` and `Cart` with their total invariants
//! - [`pricing`] - Bundle tiers, coupon stacking, `PricingResult`
//! - [`coupon`] - Coupon lookup and redemption-time validation
//! - [`dates`] - Delivery-date eligibility
//! - [`meal_line`] - `MealLineBuilder` and its construction rules
//! - [`order`] - Order snapshots handed to checkout
//! - [`runsheet`] - Kitchen run sheets and label records
//! - [`validation`] - Admin input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use lunchbox_core::money::Money;
//! use lunchbox_core::pricing::{bundle_discount_rate, compute_totals_for};
//!
//! // Two $12.00 meals earn the 5% bundle tier
//! assert_eq!(bundle_discount_rate(2).bps(), 500);
//!
//! let result = compute_totals_for(Money::from_cents(2400), 2, None);
//! assert_eq!(result.final_total, Money::from_cents(2280));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod dates;
pub mod error;
pub mod meal_line;
pub mod money;
pub mod order;
pub mod pricing;
pub mod runsheet;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{calculate_line_total, Cart, MealLine};
pub use coupon::{check_coupon, validate_coupon, CouponLookup};
pub use dates::{check_delivery_date, is_selectable_date, selectable_dates, DateRejection};
pub use error::{CoreError, CoreResult, CouponError, FieldError, ValidationError};
pub use meal_line::MealLineBuilder;
pub use money::{DiscountRate, Money};
pub use order::{Order, OrderLine, OrderStatus};
pub use pricing::{
    bundle_discount_rate, bundle_hint, compute_totals, compute_totals_for, BundleHint, NextTier,
    PricingResult,
};
pub use runsheet::{build_run_sheet, labels, Label, RunSheet, RunSheetEntry, SchoolRun};
pub use types::{
    AddOn, Catalog, Child, Coupon, DiscountType, Drink, Fruit, Main, MenuItem, MenuItemKind,
    Platter, School, Side,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum meal lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Longest coupon code accepted by the admin tools.
pub const MAX_COUPON_CODE_LEN: usize = 32;
