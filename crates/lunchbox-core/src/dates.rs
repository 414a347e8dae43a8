//! # Delivery Dates
//!
//! Which days a meal may be delivered.
//!
//! ## Eligibility Rules (checked in order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Weekday only                     Sat/Sun ──────► Weekend           │
//! │  2. Strictly after today             today/past ───► NotInFuture       │
//! │  3a. Promo main: in main.valid_dates        ───────► OutsidePromoWindow│
//! │  3b. Otherwise: in school.valid_dates, if the school has a list        │
//! │                                             ───────► OutsideSchoolCalendar
//! │  4. Not an admin-blocked date               ───────► Blocked           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failing date is simply not selectable; the order dialog disables it.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;
use thiserror::Error;

use crate::types::{Main, School};

/// Why a date cannot be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum DateRejection {
    #[error("No deliveries on weekends")]
    Weekend,

    #[error("Orders must be placed at least one day ahead")]
    NotInFuture,

    #[error("This promotion is not available on that day")]
    OutsidePromoWindow,

    #[error("The school is closed on that day")]
    OutsideSchoolCalendar,

    #[error("No deliveries on that day")]
    Blocked,
}

/// Checks `date` against the delivery rules for `main` at `school`.
///
/// ## Example
/// ```rust,ignore
/// let friday = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
/// let saturday = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
/// assert_eq!(
///     check_delivery_date(saturday, friday, &main, &school, &blocked),
///     Err(DateRejection::Weekend)
/// );
/// ```
pub fn check_delivery_date(
    date: NaiveDate,
    today: NaiveDate,
    main: &Main,
    school: &School,
    blocked: &BTreeSet<NaiveDate>,
) -> Result<(), DateRejection> {
    check_against_calendar(date, today, main, school.valid_dates.as_ref(), blocked)
}

/// Same rules with the school calendar given directly; `None` means every
/// weekday is open.
pub(crate) fn check_against_calendar(
    date: NaiveDate,
    today: NaiveDate,
    main: &Main,
    calendar: Option<&BTreeSet<NaiveDate>>,
    blocked: &BTreeSet<NaiveDate>,
) -> Result<(), DateRejection> {
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(DateRejection::Weekend);
    }

    if date <= today {
        return Err(DateRejection::NotInFuture);
    }

    if main.is_promo {
        let in_window = main
            .valid_dates
            .as_ref()
            .is_some_and(|dates| dates.contains(&date));
        if !in_window {
            return Err(DateRejection::OutsidePromoWindow);
        }
    } else if let Some(calendar) = calendar {
        if !calendar.contains(&date) {
            return Err(DateRejection::OutsideSchoolCalendar);
        }
    }

    if blocked.contains(&date) {
        return Err(DateRejection::Blocked);
    }

    Ok(())
}

#[inline]
pub fn is_selectable_date(
    date: NaiveDate,
    today: NaiveDate,
    main: &Main,
    school: &School,
    blocked: &BTreeSet<NaiveDate>,
) -> bool {
    check_delivery_date(date, today, main, school, blocked).is_ok()
}

/// Selectable dates in `[from, from + days)`, in order.
pub fn selectable_dates(
    from: NaiveDate,
    days: u32,
    today: NaiveDate,
    main: &Main,
    school: &School,
    blocked: &BTreeSet<NaiveDate>,
) -> Vec<NaiveDate> {
    (0..u64::from(days))
        .filter_map(|offset| from.checked_add_days(Days::new(offset)))
        .filter(|date| is_selectable_date(*date, today, main, school, blocked))
        .collect()
}
