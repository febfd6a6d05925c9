//! Activity model and its lock/delete state machine.
//!
//! An [`Activity`] is a single reportable entry on one day. It is locked
//! when its period is approved and unlocked again on unapproval.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReportingError, ReportingResult};

/// The kind of activity being reported.
///
/// # Example
///
/// ```
/// use reporting_engine::models::ActivityType;
///
/// assert_eq!(ActivityType::ALL.len(), 3);
/// assert_eq!(ActivityType::Work.to_string(), "work");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Hours of work.
    Work,
    /// Sickness.
    Sick,
    /// Vacation or other absence.
    Vacation,
}

impl ActivityType {
    /// Every activity type, in reporting order.
    pub const ALL: [ActivityType; 3] = [Self::Work, Self::Sick, Self::Vacation];
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityType::Work => write!(f, "work"),
            ActivityType::Sick => write!(f, "sick"),
            ActivityType::Vacation => write!(f, "vacation"),
        }
    }
}

/// Lifecycle state of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// Editable; may be locked or deleted.
    Open,
    /// Frozen by an approval of the period.
    Locked,
    /// Removed by the user. Terminal.
    Deleted,
}

/// A single reported activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier for the activity.
    pub id: Uuid,
    /// The date the activity was performed.
    pub date: NaiveDate,
    /// Duration of the activity in hours.
    pub hours: Decimal,
    /// The kind of activity.
    pub activity_type: ActivityType,
    /// The lifecycle state.
    pub state: ActivityState,
}

impl Activity {
    /// Creates a new open activity with a fresh identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use reporting_engine::models::{Activity, ActivityState, ActivityType};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let activity = Activity::new(
    ///     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
    ///     Decimal::new(30, 1),
    ///     ActivityType::Work,
    /// );
    /// assert_eq!(activity.state, ActivityState::Open);
    /// assert!(activity.is_live());
    /// ```
    pub fn new(date: NaiveDate, hours: Decimal, activity_type: ActivityType) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            hours,
            activity_type,
            state: ActivityState::Open,
        }
    }

    /// Returns true unless the activity has been deleted.
    pub fn is_live(&self) -> bool {
        self.state != ActivityState::Deleted
    }

    /// Open → Locked.
    pub fn lock(&mut self) -> ReportingResult<()> {
        self.transition(ActivityState::Open, ActivityState::Locked, "lock")
    }

    /// Locked → Open.
    pub fn unlock(&mut self) -> ReportingResult<()> {
        self.transition(ActivityState::Locked, ActivityState::Open, "unlock")
    }

    /// Open → Deleted.
    pub fn delete(&mut self) -> ReportingResult<()> {
        self.transition(ActivityState::Open, ActivityState::Deleted, "delete")
    }

    fn transition(
        &mut self,
        from: ActivityState,
        to: ActivityState,
        operation: &str,
    ) -> ReportingResult<()> {
        if self.state != from {
            return Err(ReportingError::illegal_state(format!(
                "cannot {} activity {} in state {:?}",
                operation, self.id, self.state
            )));
        }
        self.state = to;
        Ok(())
    }
}
