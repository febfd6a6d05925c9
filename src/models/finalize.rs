//! Strategy for computing when an approved period becomes due for submission.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How a new period's finalize-after date is computed.
///
/// Injected from configuration when periods are created.
///
/// # Example
///
/// ```
/// use reporting_engine::models::FinalizeStrategy;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
///
/// let strategy = FinalizeStrategy::DaysBeforePeriodEnd { days: 1 };
/// assert_eq!(strategy.finalize_after(start, end), NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
/// assert_eq!(FinalizeStrategy::FromPeriodStart.finalize_after(start, end), start);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FinalizeStrategy {
    /// Due as soon as the period has started.
    FromPeriodStart,
    /// Due a number of days before the period ends.
    DaysBeforePeriodEnd {
        /// Days subtracted from the period end.
        days: u32,
    },
}

impl FinalizeStrategy {
    /// Computes the finalize-after date for a period.
    pub fn finalize_after(&self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        match self {
            FinalizeStrategy::FromPeriodStart => start,
            FinalizeStrategy::DaysBeforePeriodEnd { days } => {
                end.checked_sub_signed(Duration::days(i64::from(*days)))
                    .map_or(start, |date| date.max(start))
            }
        }
    }
}

impl Default for FinalizeStrategy {
    fn default() -> Self {
        FinalizeStrategy::DaysBeforePeriodEnd { days: 1 }
    }
}
