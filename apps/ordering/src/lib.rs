//! # lunchbox-app: Ordering Application Layer
//!
//! Wires lunchbox-core and lunchbox-db together behind plain async
//! commands. The `lunchbox` binary is a thin clap front end over them.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Resolve configuration (flags, `LUNCHBOX_*` variables, defaults)
//! 3. Determine database path (override or platform data directory)
//! 4. Connect to database & run migrations
//! 5. Create state objects (DbState, CartState, ConfigState)
//! 6. Run the requested command
//!
//! ## Module Organization
//! - [`commands`] - Catalog, cart, coupon, checkout and run-sheet commands
//! - [`state`] - Shared application state
//! - [`error`] - `ApiError`, the serializable command error

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use directories::ProjectDirs;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lunchbox_db::{Database, DbConfig, DbError};

pub use error::{ApiError, CouponReason, ErrorCode};
pub use state::{CartSession, CartState, ConfigState, DbState};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,lunchbox=debug,sqlx=warn";

const DB_FILE_NAME: &str = "lunchbox.db";

/// Errors that stop the application before any command runs.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` selects `debug`, and the
/// default is [`DEFAULT_LOG_FILTER`]. Logs go to stderr so command output
/// on stdout stays machine-readable.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { DEFAULT_LOG_FILTER })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.lunchbox.ordering/lunchbox.db`
/// - **Windows**: `%APPDATA%\lunchbox\ordering\data\lunchbox.db`
/// - **Linux**: `~/.local/share/ordering/lunchbox.db`
///
/// `config.database_path` overrides the platform location.
pub fn database_path(config: &ConfigState) -> Result<PathBuf, StartupError> {
    if let Some(path) = &config.database_path {
        return Ok(path.clone());
    }

    let proj_dirs = ProjectDirs::from("com", "lunchbox", "ordering").ok_or(StartupError::NoDataDir)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join(DB_FILE_NAME))
}

/// Opens the database (running migrations) and wraps it for commands.
pub async fn open_database(config: &ConfigState) -> Result<DbState, StartupError> {
    let path = database_path(config)?;
    info!(path = %path.display(), "Opening database");

    let db = Database::new(DbConfig::new(path)).await?;
    Ok(DbState::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_override() {
        let config = ConfigState {
            database_path: Some(PathBuf::from("/srv/lunchbox/test.db")),
            ..ConfigState::default()
        };

        assert_eq!(
            database_path(&config).unwrap(),
            PathBuf::from("/srv/lunchbox/test.db")
        );
    }
}
