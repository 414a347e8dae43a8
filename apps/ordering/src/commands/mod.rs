//! # Commands Module
//!
//! Async commands over the application state.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ordering Commands                                  │
//! │                                                                         │
//! │  CATALOG           CART                 COUPON          CHECKOUT        │
//! │  ───────           ────                 ──────          ────────        │
//! │  get_catalog       add_meal_lines       apply_coupon    checkout        │
//! │  get_selectable_   update_cart_line     remove_coupon   finalize_order  │
//! │    dates           remove_cart_line     create_coupon   cancel_order    │
//! │  list_children     clear_cart           update_coupon   list_orders     │
//! │                    get_cart             set_coupon_                     │
//! │                                           active                        │
//! │  QUOTE             RUN SHEET                                            │
//! │  ─────             ─────────                                            │
//! │  quote             get_run_sheet, get_labels                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command returns `Result<T, ApiError>` (or a plain value when it
//! cannot fail) and logs its invocation at debug level.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupon;
pub mod quote;
pub mod runsheet;

pub use cart::{
    add_meal_lines, build_meal_lines, clear_cart, get_cart, remove_cart_line, update_cart_line,
    CartResponse, MealRequest,
};
pub use catalog::{get_catalog, get_selectable_dates, list_children};
pub use checkout::{cancel_order, checkout, finalize_order, list_orders, CheckoutResponse};
pub use coupon::{apply_coupon, create_coupon, list_coupons, remove_coupon, set_coupon_active, update_coupon};
pub use quote::{quote, QuoteRequest, QuoteResponse};
pub use runsheet::{get_labels, get_run_sheet};
