//! Reporting obligation variants and the effects they decide on.
//!
//! An obligation never mutates the person directly. [`ReportingObligation::decide`]
//! inspects an event and returns the [`ObligationEffect`]s the person must
//! apply, which keeps every variant a pure function of its own data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::{DomainEvent, start_of_day};

/// Why, and whether, a person has to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObligationKind {
    /// No obligation to report.
    None,
    /// Reporting because an application has been submitted.
    ApplicationBased,
    /// Reporting because a case decision granted benefits.
    DecisionBased {
        /// The case submissions are filed under.
        case_id: String,
    },
}

/// One snapshot of a person's reporting obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingObligation {
    /// Unique identifier for the snapshot.
    pub id: Uuid,
    /// The variant in effect.
    pub kind: ObligationKind,
    /// When the snapshot takes effect.
    pub effective_from: DateTime<Utc>,
}

/// A change the person must apply after an obligation has seen an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObligationEffect {
    /// Ask the outside world for the submission timestamp of an application.
    RequestSubmissionTimestamp {
        /// The application to resolve.
        application_id: Uuid,
    },
    /// Append a new obligation snapshot.
    Append(ReportingObligation),
    /// Create the first period of an obligation starting on `obligation_start`.
    OpenFirstPeriod {
        /// First date the person must report for.
        obligation_start: NaiveDate,
    },
    /// Create the next sequential period if it starts on or before `date`.
    ///
    /// The back-fill boundary is not known to a single snapshot; the person
    /// derives it from the obligation history.
    OpenNextPeriod {
        /// The date the cycle started.
        date: NaiveDate,
    },
    /// Submit approved periods that have become due by `date`.
    SubmitDuePeriods {
        /// The date the deadline passed.
        date: NaiveDate,
        /// Case id stamped on the submissions.
        case_id: Option<String>,
    },
}

impl ReportingObligation {
    /// Creates a snapshot with a fresh identifier.
    pub fn new(kind: ObligationKind, effective_from: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            effective_from,
        }
    }

    /// The default obligation every person starts with.
    pub fn none_since_forever() -> Self {
        Self::new(ObligationKind::None, DateTime::<Utc>::MIN_UTC)
    }

    /// The case id submissions are stamped with under this obligation.
    pub fn case_id(&self) -> Option<&str> {
        match &self.kind {
            ObligationKind::DecisionBased { case_id } => Some(case_id),
            ObligationKind::None | ObligationKind::ApplicationBased => None,
        }
    }

    /// First date the person must report for under this obligation.
    pub fn start_date(&self) -> NaiveDate {
        self.effective_from.date_naive()
    }

    /// Decides what an event means under this obligation.
    ///
    /// Events that target a period directly, and rejections, are handled by
    /// the person and yield no effects here.
    ///
    /// # Example
    ///
    /// ```
    /// use reporting_engine::events::DomainEvent;
    /// use reporting_engine::obligation::{ObligationEffect, ObligationKind, ReportingObligation};
    /// use chrono::NaiveDate;
    ///
    /// let none = ReportingObligation::none_since_forever();
    /// let effects = none.decide(&DomainEvent::DecisionGranted {
    ///     case_id: "case-1".to_string(),
    ///     effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    /// });
    ///
    /// assert!(matches!(
    ///     &effects[0],
    ///     ObligationEffect::Append(ReportingObligation { kind: ObligationKind::DecisionBased { .. }, .. })
    /// ));
    /// assert!(matches!(effects[1], ObligationEffect::OpenFirstPeriod { .. }));
    /// ```
    pub fn decide(&self, event: &DomainEvent) -> Vec<ObligationEffect> {
        match &self.kind {
            ObligationKind::None => self.decide_without_obligation(event),
            ObligationKind::ApplicationBased => self.decide_application_based(event),
            ObligationKind::DecisionBased { case_id } => self.decide_decision_based(event, case_id),
        }
    }

    fn decide_without_obligation(&self, event: &DomainEvent) -> Vec<ObligationEffect> {
        match event {
            DomainEvent::ApplicationSubmitted { application_id, .. } => {
                vec![ObligationEffect::RequestSubmissionTimestamp {
                    application_id: *application_id,
                }]
            }
            DomainEvent::ObligationStartDetermined { start_date, .. } => vec![
                ObligationEffect::Append(Self::new(
                    ObligationKind::ApplicationBased,
                    start_of_day(*start_date),
                )),
                ObligationEffect::OpenFirstPeriod {
                    obligation_start: *start_date,
                },
            ],
            DomainEvent::DecisionGranted {
                case_id,
                effective_date,
            } => vec![
                granted(case_id, *effective_date),
                ObligationEffect::OpenFirstPeriod {
                    obligation_start: *effective_date,
                },
            ],
            _ => Vec::new(),
        }
    }

    fn decide_application_based(&self, event: &DomainEvent) -> Vec<ObligationEffect> {
        match event {
            DomainEvent::NewCycleStarted { date } => {
                vec![ObligationEffect::OpenNextPeriod { date: *date }]
            }
            DomainEvent::DecisionGranted {
                case_id,
                effective_date,
            } => vec![granted(case_id, *effective_date)],
            DomainEvent::DeadlinePassed { date } => vec![ObligationEffect::SubmitDuePeriods {
                date: *date,
                case_id: None,
            }],
            _ => Vec::new(),
        }
    }

    fn decide_decision_based(&self, event: &DomainEvent, case_id: &str) -> Vec<ObligationEffect> {
        match event {
            DomainEvent::NewCycleStarted { date } => {
                vec![ObligationEffect::OpenNextPeriod { date: *date }]
            }
            DomainEvent::DecisionGranted {
                case_id,
                effective_date,
            } => vec![granted(case_id, *effective_date)],
            DomainEvent::DeadlinePassed { date } => vec![ObligationEffect::SubmitDuePeriods {
                date: *date,
                case_id: Some(case_id.to_string()),
            }],
            _ => Vec::new(),
        }
    }
}

fn granted(case_id: &str, effective_date: NaiveDate) -> ObligationEffect {
    ObligationEffect::Append(ReportingObligation::new(
        ObligationKind::DecisionBased {
            case_id: case_id.to_string(),
        },
        start_of_day(effective_date),
    ))
}
