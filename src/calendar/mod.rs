//! Calendar logic for the Activity Reporting Engine.
//!
//! Pure functions without state: public holiday lookup and the weekday
//! arithmetic that places reporting periods and their approval dates.

mod dates;
mod holidays;

pub use dates::{
    PERIOD_LENGTH_DAYS, last_saturday_on_or_before, monday_on_or_before, period_end, shift_days,
};
pub use holidays::{PublicHoliday, easter_sunday, holidays_in_year, is_holiday};
