//! Weekday arithmetic for reporting period boundaries.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{ReportingError, ReportingResult};

/// Number of days in a reporting period.
pub const PERIOD_LENGTH_DAYS: i64 = 14;

/// Moves `date` by `days`, which may be negative.
///
/// # Errors
///
/// Returns `IllegalState` if the result falls outside the supported date range.
pub fn shift_days(date: NaiveDate, days: i64) -> ReportingResult<NaiveDate> {
    date.checked_add_signed(Duration::days(days)).ok_or_else(|| {
        ReportingError::illegal_state(format!(
            "{} shifted by {} days is outside the supported date range",
            date, days
        ))
    })
}

/// Returns the Monday of the week containing `date`.
///
/// # Example
///
/// ```
/// use reporting_engine::calendar::monday_on_or_before;
/// use chrono::NaiveDate;
///
/// let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
/// assert_eq!(
///     monday_on_or_before(wednesday).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
/// );
/// ```
pub fn monday_on_or_before(date: NaiveDate) -> ReportingResult<NaiveDate> {
    shift_days(date, -i64::from(date.weekday().num_days_from_monday()))
}

/// Returns the last Saturday on or before `date`.
///
/// # Example
///
/// ```
/// use reporting_engine::calendar::last_saturday_on_or_before;
/// use chrono::NaiveDate;
///
/// let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
/// assert_eq!(
///     last_saturday_on_or_before(sunday).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 13).unwrap()
/// );
/// ```
pub fn last_saturday_on_or_before(date: NaiveDate) -> ReportingResult<NaiveDate> {
    let saturday = Weekday::Sat.num_days_from_monday();
    let offset = (date.weekday().num_days_from_monday() + 7 - saturday) % 7;
    shift_days(date, -i64::from(offset))
}

/// Returns the inclusive end date of a period starting at `start`.
pub fn period_end(start: NaiveDate) -> ReportingResult<NaiveDate> {
    shift_days(start, PERIOD_LENGTH_DAYS - 1)
}
