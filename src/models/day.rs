//! Day model and the allowed-activity policy.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::is_holiday;
use crate::error::{ReportingError, ReportingResult};

use super::activity::{Activity, ActivityType};

/// Whether a day currently accepts a new activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPolicy {
    /// One live activity may be registered.
    SingleActivityAllowed,
    /// Nothing may be registered (locked by approval or exempt).
    NothingAllowed,
}

/// One calendar day inside a reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// The calendar date.
    pub date: NaiveDate,
    /// Every activity registered on this day, including deleted ones.
    pub activities: Vec<Activity>,
    /// The current policy.
    pub policy: DayPolicy,
    /// Set when the day was excluded from reporting by the system. Exempt
    /// days keep `NothingAllowed` through unapproval.
    #[serde(default)]
    pub exempt: bool,
}

impl Day {
    /// Creates an empty day that accepts a single activity.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            activities: Vec::new(),
            policy: DayPolicy::SingleActivityAllowed,
            exempt: false,
        }
    }

    /// The activity types that may currently be added.
    ///
    /// Empty on holidays, when the day is locked or exempt, and when a live
    /// activity already exists.
    ///
    /// # Example
    ///
    /// ```
    /// use reporting_engine::models::{ActivityType, Day};
    /// use chrono::NaiveDate;
    ///
    /// let day = Day::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    /// assert_eq!(day.allowed_types(), ActivityType::ALL.to_vec());
    ///
    /// let new_year = Day::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    /// assert!(new_year.allowed_types().is_empty());
    /// ```
    pub fn allowed_types(&self) -> Vec<ActivityType> {
        if is_holiday(self.date)
            || self.policy == DayPolicy::NothingAllowed
            || self.live_activities().next().is_some()
        {
            return Vec::new();
        }
        ActivityType::ALL.to_vec()
    }

    /// Iterates over activities that have not been deleted.
    pub fn live_activities(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(|a| a.is_live())
    }

    /// Registers an activity on this day.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the activity's date is not this day, if the
    /// hours are outside 0..=24, or if its type is not currently allowed.
    pub fn add_activity(&mut self, activity: Activity) -> ReportingResult<()> {
        if activity.date != self.date {
            return Err(ReportingError::illegal_state(format!(
                "activity dated {} can not be added to {}",
                activity.date, self.date
            )));
        }
        if activity.hours < Decimal::ZERO || activity.hours > Decimal::from(24) {
            return Err(ReportingError::illegal_state(format!(
                "activity on {} has {} hours, expected between 0 and 24",
                self.date, activity.hours
            )));
        }

        let allowed = self.allowed_types();
        if !allowed.contains(&activity.activity_type) {
            let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
            return Err(ReportingError::illegal_state(format!(
                "{} is not allowed on {}, allowed types: [{}]",
                activity.activity_type,
                self.date,
                allowed.join(", ")
            )));
        }

        self.activities.push(activity);
        Ok(())
    }

    /// Marks the activity with `activity_id` as deleted.
    ///
    /// Returns `Ok(false)` if the activity is not on this day.
    pub fn delete_activity(&mut self, activity_id: Uuid) -> ReportingResult<bool> {
        match self.activities.iter_mut().find(|a| a.id == activity_id) {
            Some(activity) => activity.delete().map(|()| true),
            None => Ok(false),
        }
    }

    /// Permanently excludes this day from reporting.
    pub fn mark_exempt(&mut self) {
        self.exempt = true;
        self.policy = DayPolicy::NothingAllowed;
    }

    /// Locks every live activity and closes the day.
    pub(crate) fn lock(&mut self) -> ReportingResult<()> {
        for activity in self.activities.iter_mut().filter(|a| a.is_live()) {
            activity.lock()?;
        }
        self.policy = DayPolicy::NothingAllowed;
        Ok(())
    }

    /// Unlocks every live activity and reopens the day unless it is exempt.
    pub(crate) fn unlock(&mut self) -> ReportingResult<()> {
        for activity in self.activities.iter_mut().filter(|a| a.is_live()) {
            activity.unlock()?;
        }
        if !self.exempt {
            self.policy = DayPolicy::SingleActivityAllowed;
        }
        Ok(())
    }

    /// Copies the day as the starting point of a correction: live activities
    /// are re-issued as open entries with fresh identifiers.
    pub(crate) fn copy_for_correction(&self) -> Self {
        Self {
            date: self.date,
            activities: self
                .live_activities()
                .map(|a| Activity::new(a.date, a.hours, a.activity_type))
                .collect(),
            policy: if self.exempt {
                DayPolicy::NothingAllowed
            } else {
                DayPolicy::SingleActivityAllowed
            },
            exempt: self.exempt,
        }
    }

    /// The reported content of the day, independent of identifiers and state.
    pub(crate) fn content(&self) -> Vec<(ActivityType, Decimal)> {
        let mut content: Vec<(ActivityType, Decimal)> = self
            .live_activities()
            .map(|a| (a.activity_type, a.hours.normalize()))
            .collect();
        content.sort();
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityState;

    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
    }

    fn work(hours: i64) -> Activity {
        Activity::new(wednesday(), Decimal::from(hours), ActivityType::Work)
    }

    #[test]
    fn test_second_live_activity_is_rejected() {
        let mut day = Day::new(wednesday());
        day.add_activity(work(3)).unwrap();

        let result = day.add_activity(Activity::new(
            wednesday(),
            Decimal::ZERO,
            ActivityType::Sick,
        ));
        match result {
            Err(ReportingError::IllegalState { message }) => {
                assert!(message.contains("allowed types: []"));
            }
            other => panic!("Expected IllegalState, got {:?}", other),
        }
    }

    #[test]
    fn test_deleted_activity_frees_the_slot() {
        let mut day = Day::new(wednesday());
        let first = work(3);
        let first_id = first.id;
        day.add_activity(first).unwrap();

        assert!(day.delete_activity(first_id).unwrap());
        assert_eq!(day.allowed_types(), ActivityType::ALL.to_vec());
        day.add_activity(work(5)).unwrap();
        assert_eq!(day.live_activities().count(), 1);
        assert_eq!(day.activities.len(), 2);
    }

    #[test]
    fn test_mismatching_date_is_rejected() {
        let mut day = Day::new(wednesday());
        let other = Activity::new(
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            Decimal::ONE,
            ActivityType::Work,
        );
        assert!(matches!(
            day.add_activity(other),
            Err(ReportingError::IllegalState { .. })
        ));
    }

    #[test]
    fn test_hours_above_a_day_are_rejected() {
        let mut day = Day::new(wednesday());
        assert!(day.add_activity(work(25)).is_err());
        assert!(day.activities.is_empty());
    }

    #[test]
    fn test_holiday_allows_nothing() {
        let mut day = Day::new(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert!(day.allowed_types().is_empty());
        let activity = Activity::new(day.date, Decimal::ONE, ActivityType::Work);
        assert!(day.add_activity(activity).is_err());
    }

    #[test]
    fn test_lock_closes_day_and_unlock_reopens_it() {
        let mut day = Day::new(wednesday());
        day.add_activity(work(3)).unwrap();

        day.lock().unwrap();
        assert_eq!(day.policy, DayPolicy::NothingAllowed);
        assert_eq!(day.activities[0].state, ActivityState::Locked);

        day.unlock().unwrap();
        assert_eq!(day.policy, DayPolicy::SingleActivityAllowed);
        assert_eq!(day.activities[0].state, ActivityState::Open);
    }

    #[test]
    fn test_exempt_day_stays_closed_after_unlock() {
        let mut day = Day::new(wednesday());
        day.mark_exempt();
        day.lock().unwrap();
        day.unlock().unwrap();
        assert_eq!(day.policy, DayPolicy::NothingAllowed);
        assert!(day.allowed_types().is_empty());
    }

    #[test]
    fn test_copy_for_correction_drops_deleted_and_reissues_ids() {
        let mut day = Day::new(wednesday());
        let deleted = work(1);
        let deleted_id = deleted.id;
        day.add_activity(deleted).unwrap();
        day.delete_activity(deleted_id).unwrap();
        day.add_activity(work(4)).unwrap();
        day.lock().unwrap();

        let copy = day.copy_for_correction();
        assert_eq!(copy.activities.len(), 1);
        assert_eq!(copy.activities[0].state, ActivityState::Open);
        assert_ne!(copy.activities[0].id, day.activities[1].id);
        assert_eq!(copy.content(), day.content());
    }
}
