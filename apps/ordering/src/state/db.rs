//! # Database State
//!
//! Wrapper around the lunchbox-db `Database` for the command layer.

use lunchbox_db::Database;

/// Database state shared by commands.
///
/// `Database` owns a connection pool and is cheap to clone.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Gets a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
