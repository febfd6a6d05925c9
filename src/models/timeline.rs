//! Activity timeline: the fixed set of days covered by a reporting period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{PERIOD_LENGTH_DAYS, is_holiday, shift_days};
use crate::error::{ReportingError, ReportingResult};

use super::activity::{Activity, ActivityType};
use super::day::Day;

/// The days of a reporting period, ordered by date.
///
/// The number of days is fixed at construction and never changes.
///
/// # Example
///
/// ```
/// use reporting_engine::models::ActivityTimeline;
/// use chrono::NaiveDate;
///
/// let timeline = ActivityTimeline::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
/// assert_eq!(timeline.days().len(), 14);
/// assert_eq!(timeline.days()[13].date, NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTimeline {
    days: Vec<Day>,
}

impl ActivityTimeline {
    /// Creates a timeline of [`PERIOD_LENGTH_DAYS`] days starting at `start`.
    ///
    /// Public holidays are marked exempt up front.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the last day falls outside the supported
    /// date range.
    pub fn new(start: NaiveDate) -> ReportingResult<Self> {
        let days = (0..PERIOD_LENGTH_DAYS)
            .map(|offset| {
                let mut day = Day::new(shift_days(start, offset)?);
                if is_holiday(day.date) {
                    day.mark_exempt();
                }
                Ok(day)
            })
            .collect::<ReportingResult<Vec<Day>>>()?;
        Ok(Self { days })
    }

    /// Rebuilds a timeline from stored days.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` unless the days are exactly
    /// [`PERIOD_LENGTH_DAYS`] consecutive dates.
    pub fn from_days(mut days: Vec<Day>) -> ReportingResult<Self> {
        days.sort_by_key(|d| d.date);
        let consecutive = days
            .windows(2)
            .all(|w| w[0].date.succ_opt() == Some(w[1].date));
        if days.len() as i64 != PERIOD_LENGTH_DAYS || !consecutive {
            return Err(ReportingError::illegal_state(format!(
                "a timeline needs {} consecutive days, got {}",
                PERIOD_LENGTH_DAYS,
                days.len()
            )));
        }
        Ok(Self { days })
    }

    /// All days, ordered by date.
    pub fn days(&self) -> &[Day] {
        &self.days
    }

    /// Looks up the day for `date`.
    pub fn day(&self, date: NaiveDate) -> Option<&Day> {
        self.days.iter().find(|d| d.date == date)
    }

    fn day_mut(&mut self, date: NaiveDate) -> ReportingResult<&mut Day> {
        self.days
            .iter_mut()
            .find(|d| d.date == date)
            .ok_or_else(|| {
                ReportingError::illegal_state(format!("{} is outside the period", date))
            })
    }

    /// Adds an activity to the day matching its date.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the date is outside the timeline or the day
    /// rejects the activity.
    pub fn add_activity(&mut self, activity: Activity) -> ReportingResult<()> {
        self.day_mut(activity.date)?.add_activity(activity)
    }

    /// Marks the activity with `activity_id` as deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no day holds the activity, or `IllegalState` if
    /// the activity is not open.
    pub fn delete_activity(&mut self, activity_id: Uuid) -> ReportingResult<()> {
        for day in &mut self.days {
            if day.delete_activity(activity_id)? {
                return Ok(());
            }
        }
        Err(ReportingError::not_found(format!("activity {}", activity_id)))
    }

    /// Permanently excludes `date` from reporting.
    pub fn mark_exempt(&mut self, date: NaiveDate) -> ReportingResult<()> {
        self.day_mut(date)?.mark_exempt();
        Ok(())
    }

    /// Locks every live activity and closes every day.
    pub(crate) fn lock(&mut self) -> ReportingResult<()> {
        self.days.iter_mut().try_for_each(Day::lock)
    }

    /// Unlocks every live activity and reopens every non-exempt day.
    pub(crate) fn unlock(&mut self) -> ReportingResult<()> {
        self.days.iter_mut().try_for_each(Day::unlock)
    }

    /// Copies the timeline as the starting point of a correction.
    pub(crate) fn copy_for_correction(&self) -> Self {
        Self {
            days: self.days.iter().map(Day::copy_for_correction).collect(),
        }
    }

    /// Returns true if both timelines report the same activities on the same
    /// dates, ignoring identifiers, activity states and deleted entries.
    pub fn same_content(&self, other: &ActivityTimeline) -> bool {
        self.content() == other.content()
    }

    fn content(&self) -> Vec<(NaiveDate, Vec<(ActivityType, Decimal)>)> {
        self.days.iter().map(|d| (d.date, d.content())).collect()
    }

    /// Total live hours reported per activity type.
    pub fn total_hours(&self, activity_type: ActivityType) -> Decimal {
        self.days
            .iter()
            .flat_map(Day::live_activities)
            .filter(|a| a.activity_type == activity_type)
            .map(|a| a.hours)
            .sum()
    }
}
