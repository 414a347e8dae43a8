//! # Lunchbox CLI
//!
//! ```text
//! lunchbox catalog                           Active catalog as JSON
//! lunchbox quote <request.json> [--coupon C] Price meal requests as JSON
//! lunchbox run-sheet <YYYY-MM-DD>            Kitchen run sheet as JSON
//! ```
//!
//! Global flags fall back to the `LUNCHBOX_*` environment variables.
//! Output goes to stdout; logs and errors go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use lunchbox_app::commands::{self, QuoteRequest};
use lunchbox_app::{init_tracing, open_database, ApiError, ConfigState, StartupError};

#[derive(Debug, Parser)]
#[command(name = "lunchbox", version, about = "School lunch ordering tools")]
struct Cli {
    /// SQLite database file (default: platform data directory)
    #[arg(long, global = true, env = "LUNCHBOX_DB_PATH")]
    db: Option<PathBuf>,

    /// Pin "today" for delivery-date checks (YYYY-MM-DD)
    #[arg(long, global = true, env = "LUNCHBOX_TODAY")]
    today: Option<NaiveDate>,

    /// Currency symbol for display amounts
    #[arg(long, global = true, env = "LUNCHBOX_CURRENCY_SYMBOL")]
    currency_symbol: Option<String>,

    /// Days ahead that selectable dates are listed
    #[arg(long, global = true, env = "LUNCHBOX_ORDER_WINDOW_DAYS")]
    order_window_days: Option<u32>,

    /// Debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the active catalog
    Catalog,

    /// Price a JSON meal request against the stored catalog
    Quote {
        /// Path to the request file
        request: PathBuf,

        /// Coupon code (overrides any code in the request)
        #[arg(long)]
        coupon: Option<String>,
    },

    /// Print the run sheet for a delivery date
    RunSheet {
        date: NaiveDate,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}", .0.message)]
    Api(#[from] ApiError),
}

impl Cli {
    fn config(&self) -> ConfigState {
        let defaults = ConfigState::default();
        ConfigState {
            database_path: self.db.clone(),
            currency_symbol: self
                .currency_symbol
                .clone()
                .unwrap_or(defaults.currency_symbol),
            today: self.today,
            order_window_days: self.order_window_days.unwrap_or(defaults.order_window_days),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Api(api)) => {
            // Command failures keep their machine-readable shape
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&api).unwrap_or_else(|_| api.to_string())
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config();
    let db = open_database(&config).await?;

    match cli.command {
        Command::Catalog => print_json(&commands::get_catalog(&db).await?),
        Command::Quote { request, coupon } => {
            let raw = std::fs::read_to_string(&request).map_err(|source| CliError::Read {
                path: request.clone(),
                source,
            })?;
            let mut req: QuoteRequest = serde_json::from_str(&raw)?;
            if coupon.is_some() {
                req.coupon = coupon;
            }
            print_json(&commands::quote(&db, &config, &req).await?)
        }
        Command::RunSheet { date } => print_json(&commands::get_run_sheet(&db, date).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
