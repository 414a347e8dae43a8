//! # lunchbox-db: Database Layer for Lunchbox
//!
//! SQLite persistence for the catalog, schools, coupons and orders, using
//! sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lunchbox Data Flow                               │
//! │                                                                         │
//! │  Command (quote, checkout, run-sheet)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   lunchbox-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SchoolRepo    │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ CouponRepo    │    │              │  │   │
//! │  │   │ Management    │    │ OrderRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir, or LUNCHBOX_DB_PATH)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lunchbox_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("lunchbox.db")).await?;
//! let catalog = db.catalog().load_catalog().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::blocked_dates::{BlockedDate, BlockedDateRepository};
pub use repository::catalog::CatalogRepository;
pub use repository::coupon::CouponRepository;
pub use repository::order::OrderRepository;
pub use repository::school::SchoolRepository;
