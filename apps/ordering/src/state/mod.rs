//! # State Module
//!
//! Application state shared by the ordering commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   DbState    │  │   CartState      │  │   ConfigState    │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  Database    │  │  Arc<Mutex<      │  │  database_path   │          │
//! │  │  (SQLite     │  │   CartSession    │  │  currency_symbol │          │
//! │  │   pool)      │  │  >>              │  │  today override  │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState: cart + applied coupon behind one Arc<Mutex<T>>           │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command declares exactly which states it needs.

mod cart;
mod config;
mod db;

pub use cart::{CartSession, CartState};
pub use config::ConfigState;
pub use db::DbState;
