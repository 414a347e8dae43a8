//! # Run Sheet Commands
//!
//! Kitchen views of paid orders for one delivery date.

use chrono::NaiveDate;
use tracing::{debug, info};

use lunchbox_core::{build_run_sheet, labels, Label, RunSheet};

use crate::error::ApiError;
use crate::state::DbState;

/// Paid meals for `date`, grouped by school.
pub async fn get_run_sheet(db: &DbState, date: NaiveDate) -> Result<RunSheet, ApiError> {
    debug!(date = %date, "get_run_sheet command");

    let orders = db.inner().orders().list_paid_for_date(date).await?;
    let sheet = build_run_sheet(date, &orders);

    info!(date = %date, schools = sheet.schools.len(), meals = sheet.total_meals, "Run sheet built");
    Ok(sheet)
}

/// One label per meal on the run sheet for `date`.
pub async fn get_labels(db: &DbState, date: NaiveDate) -> Result<Vec<Label>, ApiError> {
    debug!(date = %date, "get_labels command");

    let sheet = get_run_sheet(db, date).await?;
    Ok(labels(&sheet))
}
