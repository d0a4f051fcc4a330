//! Calendar-quarter arithmetic for disclosure periods.
//!
//! A disclosure period is identified by its canonical end date (the
//! "period of report"), which is also the reference date for price lookups.

use chrono::{Datelike, NaiveDate};

/// Returns the last day of the given month.
#[must_use]
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Returns the end date of the calendar quarter containing `date`.
#[must_use]
pub fn quarter_end(date: NaiveDate) -> Option<NaiveDate> {
    let end_month = (date.month0() / 3 + 1) * 3;
    last_day_of_month(date.year(), end_month)
}

/// Returns the end date of the calendar quarter following the one containing `date`.
#[must_use]
pub fn next_quarter_end(date: NaiveDate) -> Option<NaiveDate> {
    let end = quarter_end(date)?;
    if end.month() == 12 {
        last_day_of_month(end.year() + 1, 3)
    } else {
        last_day_of_month(end.year(), end.month() + 3)
    }
}

/// True when `later` falls in the calendar quarter right after `earlier`'s.
#[must_use]
pub fn is_next_quarter(earlier: NaiveDate, later: NaiveDate) -> bool {
    match (next_quarter_end(earlier), quarter_end(later)) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => false,
    }
}

/// Formats a period as `YYYYQn`.
#[must_use]
pub fn quarter_label(date: NaiveDate) -> String {
    format!("{}Q{}", date.year(), date.month0() / 3 + 1)
}
