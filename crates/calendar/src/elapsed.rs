//! Elapsed days and months between dates.

use chrono::{Datelike, NaiveDate};

/// Mean length of a Gregorian month in days.
pub const AVERAGE_DAYS_PER_MONTH: f64 = 30.4375;

/// Number of days from `start` to `end`, inclusive of both ends.
///
/// Returns 0 when `end` precedes `start`.
pub fn elapsed_days(start: NaiveDate, end: NaiveDate) -> usize {
    let days = (end - start).num_days();
    if days < 0 { 0 } else { days as usize + 1 }
}

/// Number of months spanned by `start..=end`.
///
/// Computed from the day difference divided by the average month length,
/// plus one because the last month-start still covers a full month.
pub fn elapsed_months(start: NaiveDate, end: NaiveDate) -> usize {
    let days = (end - start).num_days();
    if days < 0 {
        return 0;
    }
    (days as f64 / AVERAGE_DAYS_PER_MONTH + 1.0).round() as usize
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
