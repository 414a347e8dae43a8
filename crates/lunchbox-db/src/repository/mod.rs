//! # Repository Module
//!
//! Database repository implementations for Lunchbox.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command (apps/ordering)                                               │
//! │       │                                                                 │
//! │       │  db.coupons().get_by_code("WELCOME5")                          │
//! │       ▼                                                                 │
//! │  CouponRepository                                                      │
//! │  ├── get_by_code(&self, code)                                          │
//! │  ├── insert(&self, coupon)                                             │
//! │  └── update(&self, coupon)                                             │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, row structs via FromRow)                │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Row structs stay private to each repository; callers only ever        │
//! │  see lunchbox-core types.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Menu items and catalog loading
//! - [`SchoolRepository`](school::SchoolRepository) - Schools, calendars, children
//! - [`CouponRepository`](coupon::CouponRepository) - Coupon administration
//! - [`BlockedDateRepository`](blocked_dates::BlockedDateRepository) - Non-delivery days
//! - [`OrderRepository`](order::OrderRepository) - Orders, finalization, redemptions

pub mod blocked_dates;
pub mod catalog;
pub mod coupon;
pub mod order;
pub mod school;
