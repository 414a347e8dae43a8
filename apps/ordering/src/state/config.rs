//! # Configuration State
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. CLI flags (which fall back to the same environment variables)
//! 2. Environment variables (`LUNCHBOX_*`)
//! 3. Defaults (this file)
//!
//! Read-only after initialization, so no mutex needed.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use lunchbox_core::Money;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ENV_DB_PATH: &str = "LUNCHBOX_DB_PATH";
pub const ENV_CURRENCY_SYMBOL: &str = "LUNCHBOX_CURRENCY_SYMBOL";
pub const ENV_TODAY: &str = "LUNCHBOX_TODAY";
pub const ENV_ORDER_WINDOW_DAYS: &str = "LUNCHBOX_ORDER_WINDOW_DAYS";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Database file. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Pins "today" for delivery-date eligibility. `None` uses the clock.
    pub today: Option<NaiveDate>,

    /// How many days ahead selectable dates are listed.
    pub order_window_days: u32,
}

impl Default for ConfigState {
    /// Development defaults: platform database path, `$`, live clock and a
    /// four-week ordering window.
    fn default() -> Self {
        ConfigState {
            database_path: None,
            currency_symbol: "$".to_string(),
            today: None,
            order_window_days: 28,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `LUNCHBOX_DB_PATH`: database file
    /// - `LUNCHBOX_CURRENCY_SYMBOL`: display symbol
    /// - `LUNCHBOX_TODAY`: ISO date pinning "today"
    /// - `LUNCHBOX_ORDER_WINDOW_DAYS`: selectable-date window
    pub fn from_env() -> Self {
        ConfigState::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConfigState::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(symbol) = lookup(ENV_CURRENCY_SYMBOL) {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup(ENV_TODAY) {
            match raw.parse::<NaiveDate>() {
                Ok(date) => config.today = Some(date),
                Err(e) => warn!(value = %raw, "Ignoring {}: {}", ENV_TODAY, e),
            }
        }

        if let Some(raw) = lookup(ENV_ORDER_WINDOW_DAYS) {
            match raw.parse::<u32>() {
                Ok(days) => config.order_window_days = days,
                Err(e) => warn!(value = %raw, "Ignoring {}: {}", ENV_ORDER_WINDOW_DAYS, e),
            }
        }

        config
    }

    /// The pinned date, or the current UTC date.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Formats an amount with the configured symbol.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState { currency_symbol: "£".into(), ..Default::default() };
    /// assert_eq!(config.format_money(Money::from_cents(-1234)), "-£12.34");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        let cents = amount.cents();
        format!(
            "{}{}{}.{:02}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            (cents / 100).abs(),
            (cents % 100).abs()
        )
    }
}
