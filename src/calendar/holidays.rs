//! Public holiday lookup.
//!
//! Holidays are computed, not configured: the fixed-date holidays plus the
//! movable feasts derived from Easter Sunday.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A public holiday on which no activity may be reported.
///
/// # Example
///
/// ```
/// use reporting_engine::calendar::{holidays_in_year, PublicHoliday};
/// use chrono::NaiveDate;
///
/// let holidays = holidays_in_year(2024);
/// assert!(holidays.contains(&PublicHoliday {
///     date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
///     name: "Constitution Day".to_string(),
/// }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    /// The date of the public holiday.
    pub date: NaiveDate,
    /// The name of the public holiday.
    pub name: String,
}

/// Computes Easter Sunday for a year with the anonymous Gregorian algorithm.
///
/// # Example
///
/// ```
/// use reporting_engine::calendar::easter_sunday;
/// use chrono::NaiveDate;
///
/// assert_eq!(easter_sunday(2024), NaiveDate::from_ymd_opt(2024, 3, 31));
/// assert_eq!(easter_sunday(2025), NaiveDate::from_ymd_opt(2025, 4, 20));
/// ```
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// Returns every public holiday in the given year, ordered by date.
pub fn holidays_in_year(year: i32) -> Vec<PublicHoliday> {
    let fixed = [
        (1, 1, "New Year's Day"),
        (5, 1, "Labour Day"),
        (5, 17, "Constitution Day"),
        (12, 25, "Christmas Day"),
        (12, 26, "Boxing Day"),
    ];

    let mut holidays: Vec<PublicHoliday> = fixed
        .iter()
        .filter_map(|(month, day, name)| {
            NaiveDate::from_ymd_opt(year, *month, *day).map(|date| PublicHoliday {
                date,
                name: (*name).to_string(),
            })
        })
        .collect();

    if let Some(easter) = easter_sunday(year) {
        let movable = [
            (-3, "Maundy Thursday"),
            (-2, "Good Friday"),
            (0, "Easter Sunday"),
            (1, "Easter Monday"),
            (39, "Ascension Day"),
            (49, "Whit Sunday"),
            (50, "Whit Monday"),
        ];
        holidays.extend(movable.iter().filter_map(|(offset, name)| {
            easter
                .checked_add_signed(Duration::days(*offset))
                .map(|date| PublicHoliday {
                    date,
                    name: (*name).to_string(),
                })
        }));
    }

    holidays.sort_by_key(|h| h.date);
    holidays
}

/// Checks whether a date is a public holiday.
///
/// # Example
///
/// ```
/// use reporting_engine::calendar::is_holiday;
/// use chrono::NaiveDate;
///
/// assert!(is_holiday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
/// assert!(!is_holiday(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()));
/// ```
pub fn is_holiday(date: NaiveDate) -> bool {
    holidays_in_year(date.year())
        .iter()
        .any(|holiday| holiday.date == date)
}
