//! Typed domain events consumed by the [`Person`](crate::person::Person) aggregate.
//!
//! Events are constructed by the message-translation layer from transport
//! messages or HTTP requests. Only the fields the domain consumes are modelled.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ActivityType, Actor};

/// An inbound domain event for one person.
///
/// # Example
///
/// ```
/// use reporting_engine::events::DomainEvent;
///
/// let event: DomainEvent = serde_json::from_str(
///     r#"{"type": "deadline_passed", "date": "2024-01-15"}"#,
/// ).unwrap();
/// assert_eq!(event.name(), "deadline_passed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// The person submitted an application for benefits.
    ApplicationSubmitted {
        /// The application.
        application_id: Uuid,
        /// When the application was received.
        submitted_at: DateTime<Utc>,
    },
    /// The start date of the reporting obligation was resolved for an application.
    ObligationStartDetermined {
        /// The application the start date was resolved for.
        application_id: Uuid,
        /// First date the person must report for.
        start_date: NaiveDate,
    },
    /// A case decision granted benefits.
    DecisionGranted {
        /// The case the decision belongs to.
        case_id: String,
        /// The date the decision takes effect.
        effective_date: NaiveDate,
    },
    /// A case decision rejected benefits.
    DecisionRejected {
        /// The case the decision belongs to.
        case_id: String,
        /// The date the rejection takes effect.
        effective_date: NaiveDate,
    },
    /// A new reporting cycle has started.
    NewCycleStarted {
        /// The date the scheduler fired.
        date: NaiveDate,
    },
    /// The submission deadline passed for approved periods.
    DeadlinePassed {
        /// The date the scheduler fired.
        date: NaiveDate,
    },
    /// The user registered an activity.
    AddActivity {
        /// Any period in the target chain.
        period_id: Uuid,
        /// The date of the activity.
        date: NaiveDate,
        /// Duration in hours.
        hours: Decimal,
        /// The kind of activity.
        activity_type: ActivityType,
    },
    /// The user removed an activity.
    DeleteActivity {
        /// Any period in the target chain.
        period_id: Uuid,
        /// The activity to delete.
        activity_id: Uuid,
    },
    /// Approve the period for submission.
    Approve {
        /// Any period in the target chain.
        period_id: Uuid,
        /// Who approves.
        actor: Actor,
        /// The date the approval is made on, checked against the approval gate.
        reference_date: NaiveDate,
        /// When the approval happened.
        at: DateTime<Utc>,
        /// Optional free-text justification.
        #[serde(default)]
        justification: Option<String>,
    },
    /// Revoke the live approval.
    Unapprove {
        /// Any period in the target chain.
        period_id: Uuid,
        /// Who revokes.
        actor: Actor,
        /// When the revocation happened.
        at: DateTime<Utc>,
        /// Optional free-text justification.
        #[serde(default)]
        justification: Option<String>,
    },
    /// Submit an approved period without waiting for the deadline.
    ManualSubmit {
        /// Any period in the target chain.
        period_id: Uuid,
        /// When the submission was requested.
        at: DateTime<Utc>,
    },
    /// Start, or restart, a correction of a submitted period.
    Correct {
        /// Any period in the target chain.
        period_id: Uuid,
    },
}

impl DomainEvent {
    /// A stable, snake_case name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ApplicationSubmitted { .. } => "application_submitted",
            DomainEvent::ObligationStartDetermined { .. } => "obligation_start_determined",
            DomainEvent::DecisionGranted { .. } => "decision_granted",
            DomainEvent::DecisionRejected { .. } => "decision_rejected",
            DomainEvent::NewCycleStarted { .. } => "new_cycle_started",
            DomainEvent::DeadlinePassed { .. } => "deadline_passed",
            DomainEvent::AddActivity { .. } => "add_activity",
            DomainEvent::DeleteActivity { .. } => "delete_activity",
            DomainEvent::Approve { .. } => "approve",
            DomainEvent::Unapprove { .. } => "unapprove",
            DomainEvent::ManualSubmit { .. } => "manual_submit",
            DomainEvent::Correct { .. } => "correct",
        }
    }

    /// The instant used to look up the obligation governing this event.
    ///
    /// Date-only events take effect at the start of their date. Events that
    /// target a period directly return `None`, except manual submission which
    /// needs the obligation to stamp a case id.
    pub fn effective_at(&self) -> Option<DateTime<Utc>> {
        match self {
            DomainEvent::ApplicationSubmitted { submitted_at, .. } => Some(*submitted_at),
            DomainEvent::ObligationStartDetermined { start_date, .. } => {
                Some(start_of_day(*start_date))
            }
            DomainEvent::DecisionGranted { effective_date, .. }
            | DomainEvent::DecisionRejected { effective_date, .. } => {
                Some(start_of_day(*effective_date))
            }
            DomainEvent::NewCycleStarted { date } | DomainEvent::DeadlinePassed { date } => {
                Some(start_of_day(*date))
            }
            DomainEvent::ManualSubmit { at, .. } => Some(*at),
            DomainEvent::AddActivity { .. }
            | DomainEvent::DeleteActivity { .. }
            | DomainEvent::Approve { .. }
            | DomainEvent::Unapprove { .. }
            | DomainEvent::Correct { .. } => None,
        }
    }

    /// The period the event targets, if it targets one.
    pub fn period_id(&self) -> Option<Uuid> {
        match self {
            DomainEvent::AddActivity { period_id, .. }
            | DomainEvent::DeleteActivity { period_id, .. }
            | DomainEvent::Approve { period_id, .. }
            | DomainEvent::Unapprove { period_id, .. }
            | DomainEvent::ManualSubmit { period_id, .. }
            | DomainEvent::Correct { period_id } => Some(*period_id),
            _ => None,
        }
    }
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
