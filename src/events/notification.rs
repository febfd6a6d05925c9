//! Notifications emitted by the aggregate after an event has been applied.
//!
//! Notifications are returned to the caller rather than pushed to observers;
//! the dispatch layer decides how to publish them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Day, PeriodState};

/// Something the outside world should be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A period was created or changed state.
    PeriodStateChanged {
        /// The period.
        period_id: Uuid,
        /// The state after the change.
        state: PeriodState,
        /// The state before the change, absent when the period was created.
        previous: Option<PeriodState>,
        /// First date of the period.
        start: NaiveDate,
        /// Last date of the period.
        end: NaiveDate,
    },
    /// A period was submitted to the authority.
    PeriodSubmitted {
        /// The submitted period.
        period_id: Uuid,
        /// First date of the period.
        start: NaiveDate,
        /// Last date of the period.
        end: NaiveDate,
        /// Every day of the period with its activities.
        days: Vec<Day>,
        /// The case the submission is filed under, if a decision exists.
        case_id: Option<String>,
        /// The period this submission corrects, if any.
        corrects: Option<Uuid>,
    },
    /// The submission timestamp of an application must be resolved externally.
    SubmissionTimestampRequested {
        /// The application to resolve.
        application_id: Uuid,
    },
}

impl Notification {
    /// The period this notification concerns, if any.
    pub fn period_id(&self) -> Option<Uuid> {
        match self {
            Notification::PeriodStateChanged { period_id, .. }
            | Notification::PeriodSubmitted { period_id, .. } => Some(*period_id),
            Notification::SubmissionTimestampRequested { .. } => None,
        }
    }
}
