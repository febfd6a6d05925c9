//! The person aggregate: single entry point for every domain event.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::{ReportingError, ReportingResult};
use crate::events::{DomainEvent, Notification, start_of_day};
use crate::models::{
    Activity, Actor, ApprovalChange, FinalizeStrategy, PeriodTable, ReportingPeriod,
};
use crate::obligation::{
    ObligationEffect, ObligationKind, ReportingObligation, TemporalCollection,
};

/// A person with a reporting obligation history and the periods they own.
///
/// # Example
///
/// ```
/// use reporting_engine::events::DomainEvent;
/// use reporting_engine::models::{FinalizeStrategy, PeriodState};
/// use reporting_engine::person::Person;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let mut person = Person::new("12345678901");
/// let notifications = person
///     .handle(
///         DomainEvent::ObligationStartDetermined {
///             application_id: Uuid::new_v4(),
///             start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         },
///         &FinalizeStrategy::default(),
///     )
///     .unwrap();
///
/// assert_eq!(notifications.len(), 1);
/// let period = person.periods().roots()[0];
/// assert_eq!(period.state(), PeriodState::ToBeFilled);
/// assert_eq!(period.end(), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    ident: String,
    obligations: TemporalCollection<ReportingObligation>,
    periods: PeriodTable,
}

impl Person {
    /// Creates a person without any obligation to report.
    pub fn new(ident: impl Into<String>) -> Self {
        let mut obligations = TemporalCollection::new();
        let none = ReportingObligation::none_since_forever();
        obligations.put(none.effective_from, none);
        Self {
            ident: ident.into(),
            obligations,
            periods: PeriodTable::new(),
        }
    }

    /// Reassembles a person from stored parts.
    ///
    /// The default obligation is added if the history lacks one.
    pub(crate) fn from_parts(
        ident: String,
        history: Vec<ReportingObligation>,
        periods: PeriodTable,
    ) -> ReportingResult<Self> {
        periods.validate()?;
        let mut person = Self::new(ident);
        for obligation in history {
            person.obligations.put(obligation.effective_from, obligation);
        }
        person.periods = periods;
        Ok(person)
    }

    /// The person's identity.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// The obligation history.
    pub fn obligations(&self) -> &TemporalCollection<ReportingObligation> {
        &self.obligations
    }

    /// The obligation in effect at `at`.
    pub fn obligation_at(&self, at: DateTime<Utc>) -> ReportingResult<&ReportingObligation> {
        self.obligations.get(at)
    }

    /// First date of the unbroken obligation run in effect at `at`.
    ///
    /// Successive non-`None` snapshots form one run: a decision granted while
    /// an application-based obligation is in effect does not move the start.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if no obligation to report is in effect at `at`.
    pub fn obligated_since(&self, at: DateTime<Utc>) -> ReportingResult<NaiveDate> {
        let mut since = None;
        for (_, obligation) in self.obligations.iter().take_while(|(from, _)| **from <= at) {
            since = match obligation.kind {
                ObligationKind::None => None,
                ObligationKind::ApplicationBased | ObligationKind::DecisionBased { .. } => {
                    since.or(Some(obligation.start_date()))
                }
            };
        }
        since.ok_or_else(|| {
            ReportingError::illegal_state(format!("no obligation to report is in effect at {}", at))
        })
    }

        /// Every period, superseded corrections included.
    pub fn periods(&self) -> &PeriodTable {
        &self.periods
    }

    /// Looks up a period by id.
    pub fn period(&self, id: uuid::Uuid) -> ReportingResult<&ReportingPeriod> {
        self.periods.get(id)
    }

    /// The newest correction in the chain `id` belongs to.
    pub fn latest_correction(&self, id: uuid::Uuid) -> ReportingResult<&ReportingPeriod> {
        self.periods.latest_correction(id)
    }

    /// Applies one event and returns the resulting notifications.
    ///
    /// The event is applied to a working copy; on error the person is left
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while applying the event.
    pub fn handle(
        &mut self,
        event: DomainEvent,
        strategy: &FinalizeStrategy,
    ) -> ReportingResult<Vec<Notification>> {
        let name = event.name();
        let mut working = self.clone();
        let notifications = working.apply(event, strategy)?;
        *self = working;

        debug!(
            ident = %self.ident,
            event = name,
            notifications = notifications.len(),
            "event applied"
        );
        Ok(notifications)
    }

    fn apply(
        &mut self,
        event: DomainEvent,
        strategy: &FinalizeStrategy,
    ) -> ReportingResult<Vec<Notification>> {
        match event {
            DomainEvent::DecisionRejected { effective_date, .. } => {
                self.append_obligation(ReportingObligation::new(
                    ObligationKind::None,
                    start_of_day(effective_date),
                ));
                Ok(Vec::new())
            }
            DomainEvent::AddActivity {
                period_id,
                date,
                hours,
                activity_type,
            } => {
                self.periods
                    .add_activity(period_id, Activity::new(date, hours, activity_type))?;
                Ok(Vec::new())
            }
            DomainEvent::DeleteActivity {
                period_id,
                activity_id,
            } => {
                self.periods.delete_activity(period_id, activity_id)?;
                Ok(Vec::new())
            }
            DomainEvent::Approve {
                period_id,
                actor,
                reference_date,
                at,
                justification,
            } => {
                self.authorize(&actor)?;
                self.periods.approve(
                    period_id,
                    ApprovalChange::new(actor, at, justification),
                    reference_date,
                )
            }
            DomainEvent::Unapprove {
                period_id,
                actor,
                at,
                justification,
            } => {
                self.authorize(&actor)?;
                self.periods.unapprove(period_id, actor, at, justification)
            }
            DomainEvent::ManualSubmit { period_id, at } => {
                let case_id = self.obligation_at(at)?.case_id().map(str::to_string);
                self.periods.manual_submit(period_id, case_id)
            }
            DomainEvent::Correct { period_id } => self.periods.correct(period_id),
            event => self.apply_obligation_event(&event, strategy),
        }
    }

    fn apply_obligation_event(
        &mut self,
        event: &DomainEvent,
        strategy: &FinalizeStrategy,
    ) -> ReportingResult<Vec<Notification>> {
        let at = event.effective_at().ok_or_else(|| {
            ReportingError::illegal_state(format!("{} has no effective instant", event.name()))
        })?;
        let effects = self.obligation_at(at)?.decide(event);
        if effects.is_empty() {
            debug!(ident = %self.ident, event = event.name(), "event ignored by obligation");
        }

        let mut notifications = Vec::new();
        for effect in effects {
            match effect {
                ObligationEffect::RequestSubmissionTimestamp { application_id } => {
                    notifications.push(Notification::SubmissionTimestampRequested {
                        application_id,
                    });
                }
                ObligationEffect::Append(obligation) => self.append_obligation(obligation),
                ObligationEffect::OpenFirstPeriod { obligation_start } => {
                    notifications.extend(
                        self.periods.open_first_period(obligation_start, strategy)?,
                    );
                }
                ObligationEffect::OpenNextPeriod { date } => {
                    let obligated_since = self.obligated_since(at)?;
                    notifications.extend(self.periods.open_next_period(
                        obligated_since,
                        date,
                        strategy,
                    )?);
                }
                ObligationEffect::SubmitDuePeriods { date, case_id } => {
                    notifications.extend(self.periods.submit_due(date, case_id.as_deref())?);
                }
            }
        }
        Ok(notifications)
    }

    fn append_obligation(&mut self, obligation: ReportingObligation) {
        info!(
            ident = %self.ident,
            obligation_id = %obligation.id,
            kind = ?obligation.kind,
            effective_from = %obligation.effective_from,
            "obligation appended"
        );
        self.obligations.put(obligation.effective_from, obligation);
    }

    fn authorize(&self, actor: &Actor) -> ReportingResult<()> {
        match actor {
            Actor::EndUser { ident } if *ident != self.ident => Err(ReportingError::Unauthorized {
                actor: actor.to_string(),
                message: "may only act on their own periods".to_string(),
            }),
            Actor::EndUser { .. } | Actor::CaseWorker { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, PeriodState};
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    const IDENT: &str = "12345678901";

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn strategy() -> FinalizeStrategy {
        FinalizeStrategy::default()
    }

    fn user(ident: &str) -> Actor {
        Actor::EndUser {
            ident: ident.to_string(),
        }
    }

    fn granted(case_id: &str, m: u32, d: u32) -> DomainEvent {
        DomainEvent::DecisionGranted {
            case_id: case_id.to_string(),
            effective_date: date(m, d),
        }
    }

    fn approve(period_id: Uuid, actor: Actor, reference_date: NaiveDate) -> DomainEvent {
        DomainEvent::Approve {
            period_id,
            actor,
            reference_date,
            at: start_of_day(reference_date),
            justification: None,
        }
    }

    fn person_with_period() -> (Person, Uuid) {
        let mut person = Person::new(IDENT);
        let notifications = person.handle(granted("case-1", 1, 1), &strategy()).unwrap();
        let period_id = notifications[0].period_id().unwrap();
        (person, period_id)
    }

    #[test]
    fn test_new_person_has_default_obligation() {
        let person = Person::new(IDENT);
        let obligation = person.obligation_at(start_of_day(date(1, 1))).unwrap();
        assert_eq!(obligation.kind, ObligationKind::None);
        assert!(person.periods().is_empty());
    }

    #[test]
    fn test_rejection_appends_none_obligation() {
        let (mut person, _) = person_with_period();
        person
            .handle(
                DomainEvent::DecisionRejected {
                    case_id: "case-1".to_string(),
                    effective_date: date(3, 1),
                },
                &strategy(),
            )
            .unwrap();

        let before = person.obligation_at(start_of_day(date(2, 1))).unwrap();
        assert_eq!(before.case_id(), Some("case-1"));
        let after = person.obligation_at(start_of_day(date(3, 1))).unwrap();
        assert_eq!(after.kind, ObligationKind::None);
        assert_eq!(person.obligations().len(), 3);
    }

    #[test]
    fn test_failed_event_leaves_person_untouched() {
        let (mut person, period_id) = person_with_period();
        let before = person.clone();

        let result = person.handle(approve(period_id, user(IDENT), date(1, 12)), &strategy());

        assert!(matches!(result, Err(ReportingError::GateTooEarly { .. })));
        assert_eq!(person, before);
    }

    #[test]
    fn test_end_user_may_not_approve_for_someone_else() {
        let (mut person, period_id) = person_with_period();
        let result = person.handle(approve(period_id, user("other"), date(1, 13)), &strategy());
        assert!(matches!(result, Err(ReportingError::Unauthorized { .. })));
    }

    #[test]
    fn test_case_worker_may_revoke_end_user_approval() {
        let (mut person, period_id) = person_with_period();
        person
            .handle(approve(period_id, user(IDENT), date(1, 13)), &strategy())
            .unwrap();

        person
            .handle(
                DomainEvent::Unapprove {
                    period_id,
                    actor: Actor::CaseWorker {
                        id: "Z999".to_string(),
                    },
                    at: start_of_day(date(1, 13)),
                    justification: Some("wrong hours".to_string()),
                },
                &strategy(),
            )
            .unwrap();
        assert_eq!(
            person.period(period_id).unwrap().state(),
            PeriodState::ToBeFilled
        );
    }

    #[test]
    fn test_manual_submit_stamps_case_id_in_effect() {
        let (mut person, period_id) = person_with_period();
        person
            .handle(approve(period_id, user(IDENT), date(1, 13)), &strategy())
            .unwrap();
        person
            .handle(
                DomainEvent::ManualSubmit {
                    period_id,
                    at: Utc.with_ymd_and_hms(2024, 1, 13, 12, 0, 0).unwrap(),
                },
                &strategy(),
            )
            .unwrap();
        assert_eq!(person.period(period_id).unwrap().case_id(), Some("case-1"));
    }

    #[test]
    fn test_activities_route_to_the_newest_correction() {
        let (mut person, period_id) = person_with_period();
        person
            .handle(approve(period_id, user(IDENT), date(1, 13)), &strategy())
            .unwrap();
        person
            .handle(
                DomainEvent::DeadlinePassed { date: date(1, 13) },
                &strategy(),
            )
            .unwrap();
        let correction_id = person
            .handle(DomainEvent::Correct { period_id }, &strategy())
            .unwrap()[0]
            .period_id()
            .unwrap();

        person
            .handle(
                DomainEvent::AddActivity {
                    period_id,
                    date: date(1, 3),
                    hours: Decimal::from(4),
                    activity_type: ActivityType::Work,
                },
                &strategy(),
            )
            .unwrap();

        let correction = person.latest_correction(period_id).unwrap();
        assert_eq!(correction.id(), correction_id);
        assert_eq!(correction.timeline().total_hours(ActivityType::Work), Decimal::from(4));
        assert_eq!(
            person
                .period(period_id)
                .unwrap()
                .timeline()
                .total_hours(ActivityType::Work),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_obligation_run_spans_application_and_decision() {
        let mut person = Person::new(IDENT);
        person
            .handle(
                DomainEvent::ObligationStartDetermined {
                    application_id: Uuid::new_v4(),
                    start_date: date(1, 1),
                },
                &strategy(),
            )
            .unwrap();
        person.handle(granted("case-1", 1, 17), &strategy()).unwrap();

        assert_eq!(person.obligated_since(start_of_day(date(1, 20))).unwrap(), date(1, 1));

        person
            .handle(
                DomainEvent::DecisionRejected {
                    case_id: "case-1".to_string(),
                    effective_date: date(2, 1),
                },
                &strategy(),
            )
            .unwrap();
        assert!(person.obligated_since(start_of_day(date(2, 5))).is_err());

        person.handle(granted("case-2", 3, 6), &strategy()).unwrap();
        assert_eq!(person.obligated_since(start_of_day(date(3, 10))).unwrap(), date(3, 6));
    }

    #[test]
    fn test_decision_after_application_does_not_exempt_new_periods() {
        let mut person = Person::new(IDENT);
        person
            .handle(
                DomainEvent::ObligationStartDetermined {
                    application_id: Uuid::new_v4(),
                    start_date: date(1, 1),
                },
                &strategy(),
            )
            .unwrap();
        person.handle(granted("case-1", 1, 17), &strategy()).unwrap();
        let notifications = person
            .handle(DomainEvent::NewCycleStarted { date: date(1, 17) }, &strategy())
            .unwrap();

        let second = person.period(notifications[0].period_id().unwrap()).unwrap();
        assert_eq!(second.start(), date(1, 15));
        let exempt: Vec<NaiveDate> = second
            .timeline()
            .days()
            .iter()
            .filter(|d| d.exempt)
            .map(|d| d.date)
            .collect();
        assert!(exempt.is_empty(), "unexpected exempt days: {:?}", exempt);
    }

    #[test]
    fn test_out_of_range_decision_date_is_rejected() {
        let mut person = Person::new(IDENT);
        let result = person.handle(
            DomainEvent::DecisionGranted {
                case_id: "case-1".to_string(),
                effective_date: NaiveDate::MAX,
            },
            &strategy(),
        );

        assert!(matches!(result, Err(ReportingError::IllegalState { .. })));
        assert_eq!(person.obligations().len(), 1);
        assert!(person.periods().is_empty());
    }
}
