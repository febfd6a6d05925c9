//! Reporting period and its approval/submission state machine.
//!
//! A [`ReportingPeriod`] is a fixed 14-day window. It moves from
//! [`PeriodState::ToBeFilled`] to [`PeriodState::Approved`] to
//! [`PeriodState::Submitted`], and a submitted period can only be amended by
//! a new period that corrects it. Operations that need the rest of the
//! correction chain live on [`PeriodTable`](super::PeriodTable).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{last_saturday_on_or_before, period_end};
use crate::error::{ReportingError, ReportingResult};
use crate::events::Notification;

use super::activity::Activity;
use super::approval_log::{Actor, ApprovalChange, ApprovalLog};
use super::finalize::FinalizeStrategy;
use super::timeline::ActivityTimeline;

/// The lifecycle state of a reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodState {
    /// Open for reporting.
    ToBeFilled,
    /// Approved by the user or a case worker, waiting for the deadline.
    Approved,
    /// Sent to the authority. Only a correction can change it.
    Submitted,
}

impl std::fmt::Display for PeriodState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodState::ToBeFilled => write!(f, "to be filled"),
            PeriodState::Approved => write!(f, "approved"),
            PeriodState::Submitted => write!(f, "submitted"),
        }
    }
}

/// A 14-day reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub(crate) id: Uuid,
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
    pub(crate) approvable_from: NaiveDate,
    pub(crate) finalize_after: NaiveDate,
    pub(crate) state: PeriodState,
    pub(crate) timeline: ActivityTimeline,
    pub(crate) approvals: ApprovalLog,
    pub(crate) corrects: Option<Uuid>,
    pub(crate) corrected_by: Option<Uuid>,
    pub(crate) case_id: Option<String>,
}

impl ReportingPeriod {
    /// Creates an empty period starting at `start`.
    ///
    /// # Example
    ///
    /// ```
    /// use reporting_engine::models::{FinalizeStrategy, PeriodState, ReportingPeriod};
    /// use chrono::NaiveDate;
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let period = ReportingPeriod::new(start, &FinalizeStrategy::default()).unwrap();
    ///
    /// assert_eq!(period.end(), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
    /// assert_eq!(period.approvable_from(), NaiveDate::from_ymd_opt(2024, 1, 13).unwrap());
    /// assert_eq!(period.state(), PeriodState::ToBeFilled);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if the period would end outside the supported
    /// date range.
    pub fn new(start: NaiveDate, strategy: &FinalizeStrategy) -> ReportingResult<Self> {
        let end = period_end(start)?;
        Ok(Self {
            id: Uuid::new_v4(),
            start,
            end,
            approvable_from: last_saturday_on_or_before(end)?,
            finalize_after: strategy.finalize_after(start, end),
            state: PeriodState::ToBeFilled,
            timeline: ActivityTimeline::new(start)?,
            approvals: ApprovalLog::new(),
            corrects: None,
            corrected_by: None,
            case_id: None,
        })
    }

    /// Creates a draft that corrects `original`, starting from its timeline.
    pub(crate) fn correction_of(original: &ReportingPeriod) -> Self {
        Self {
            id: Uuid::new_v4(),
            start: original.start,
            end: original.end,
            approvable_from: original.approvable_from,
            finalize_after: original.finalize_after,
            state: PeriodState::ToBeFilled,
            timeline: original.timeline.copy_for_correction(),
            approvals: ApprovalLog::new(),
            corrects: Some(original.id),
            corrected_by: None,
            case_id: None,
        }
    }

    /// Unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// First date of the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the period.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Earliest reference date an approval is accepted on.
    pub fn approvable_from(&self) -> NaiveDate {
        self.approvable_from
    }

    /// Date from which an approved period is submitted by the deadline.
    pub fn finalize_after(&self) -> NaiveDate {
        self.finalize_after
    }

    /// Current state.
    pub fn state(&self) -> PeriodState {
        self.state
    }

    /// The days and activities.
    pub fn timeline(&self) -> &ActivityTimeline {
        &self.timeline
    }

    /// The approval history.
    pub fn approvals(&self) -> &ApprovalLog {
        &self.approvals
    }

    /// The period this one corrects.
    pub fn corrects(&self) -> Option<Uuid> {
        self.corrects
    }

    /// The period that corrects this one.
    pub fn corrected_by(&self) -> Option<Uuid> {
        self.corrected_by
    }

    /// The case id stamped at submission.
    pub fn case_id(&self) -> Option<&str> {
        self.case_id.as_deref()
    }

    /// Returns true if the date lies within the period.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub(crate) fn unsupported(&self, operation: &str) -> ReportingError {
        ReportingError::illegal_state(format!(
            "period {}: {} is not supported while {}",
            self.id, operation, self.state
        ))
    }

    fn ensure_state(&self, expected: PeriodState, operation: &str) -> ReportingResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.unsupported(operation))
        }
    }

    pub(crate) fn state_changed(&self, previous: Option<PeriodState>) -> Notification {
        Notification::PeriodStateChanged {
            period_id: self.id,
            state: self.state,
            previous,
            start: self.start,
            end: self.end,
        }
    }

    fn submitted(&self) -> Notification {
        Notification::PeriodSubmitted {
            period_id: self.id,
            start: self.start,
            end: self.end,
            days: self.timeline.days().to_vec(),
            case_id: self.case_id.clone(),
            corrects: self.corrects,
        }
    }

    /// ToBeFilled: registers an activity.
    pub(crate) fn add_activity(&mut self, activity: Activity) -> ReportingResult<()> {
        self.ensure_state(PeriodState::ToBeFilled, "adding an activity")?;
        self.timeline.add_activity(activity)
    }

    /// ToBeFilled: deletes an activity.
    pub(crate) fn delete_activity(&mut self, activity_id: Uuid) -> ReportingResult<()> {
        self.ensure_state(PeriodState::ToBeFilled, "deleting an activity")?;
        self.timeline.delete_activity(activity_id)
    }

    /// ToBeFilled → Approved.
    ///
    /// `corrected` is the timeline of the period this one corrects; a
    /// correction must differ from it to be approved.
    pub(crate) fn approve(
        &mut self,
        change: ApprovalChange,
        reference_date: NaiveDate,
        corrected: Option<&ActivityTimeline>,
    ) -> ReportingResult<Vec<Notification>> {
        self.ensure_state(PeriodState::ToBeFilled, "approval")?;
        if reference_date < self.approvable_from {
            return Err(ReportingError::GateTooEarly {
                approvable_from: self.approvable_from,
                attempted: reference_date,
            });
        }
        if corrected.is_some_and(|original| self.timeline.same_content(original)) {
            return Err(ReportingError::illegal_state(format!(
                "period {}: the correction has no actual change",
                self.id
            )));
        }

        self.approvals.add(change)?;
        self.timeline.lock()?;
        self.state = PeriodState::Approved;
        Ok(vec![self.state_changed(Some(PeriodState::ToBeFilled))])
    }

    /// Approved → ToBeFilled.
    pub(crate) fn unapprove(
        &mut self,
        actor: Actor,
        at: DateTime<Utc>,
        justification: Option<String>,
    ) -> ReportingResult<Vec<Notification>> {
        self.ensure_state(PeriodState::Approved, "unapproval")?;
        self.approvals.revoke(actor, at, justification)?;
        self.timeline.unlock()?;
        self.state = PeriodState::ToBeFilled;
        Ok(vec![self.state_changed(Some(PeriodState::Approved))])
    }

    /// Approved → Submitted once `date` has reached the finalize-after date.
    ///
    /// Returns no notifications while the period is not yet due.
    pub(crate) fn deadline_passed(
        &mut self,
        date: NaiveDate,
        case_id: Option<String>,
    ) -> ReportingResult<Vec<Notification>> {
        self.ensure_state(PeriodState::Approved, "submission by deadline")?;
        if date < self.finalize_after {
            return Ok(Vec::new());
        }
        Ok(self.submit(case_id))
    }

    /// Approved → Submitted regardless of the deadline.
    pub(crate) fn manual_submit(
        &mut self,
        case_id: Option<String>,
    ) -> ReportingResult<Vec<Notification>> {
        self.ensure_state(PeriodState::Approved, "manual submission")?;
        Ok(self.submit(case_id))
    }

    fn submit(&mut self, case_id: Option<String>) -> Vec<Notification> {
        self.case_id = case_id;
        self.state = PeriodState::Submitted;
        vec![
            self.state_changed(Some(PeriodState::Approved)),
            self.submitted(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityState, ActivityType};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 13, 12, 0, 0).unwrap()
    }

    fn user() -> Actor {
        Actor::EndUser {
            ident: "12345678901".to_string(),
        }
    }

    fn period() -> ReportingPeriod {
        ReportingPeriod::new(date(1, 1), &FinalizeStrategy::default()).unwrap()
    }

    fn approved() -> ReportingPeriod {
        let mut period = period();
        period
            .add_activity(Activity::new(date(1, 3), Decimal::from(3), ActivityType::Work))
            .unwrap();
        period
            .approve(ApprovalChange::new(user(), at(), None), date(1, 13), None)
            .unwrap();
        period
    }

    #[test]
    fn test_period_past_last_date_is_rejected() {
        let result = ReportingPeriod::new(NaiveDate::MAX, &FinalizeStrategy::default());
        assert!(matches!(result, Err(ReportingError::IllegalState { .. })));
    }

    #[test]
    fn test_approve_before_gate_is_too_early() {
        let mut period = period();
        let result = period.approve(ApprovalChange::new(user(), at(), None), date(1, 12), None);
        assert_eq!(
            result,
            Err(ReportingError::GateTooEarly {
                approvable_from: date(1, 13),
                attempted: date(1, 12),
            })
        );
        assert_eq!(period.state(), PeriodState::ToBeFilled);
        assert!(period.approvals().entries().is_empty());
    }

    #[test]
    fn test_approve_locks_everything() {
        let period = approved();
        assert_eq!(period.state(), PeriodState::Approved);
        assert!(period.approvals().is_approved());
        assert!(
            period
                .timeline()
                .days()
                .iter()
                .all(|d| d.allowed_types().is_empty())
        );
        let day = period.timeline().day(date(1, 3)).unwrap();
        assert_eq!(day.activities[0].state, ActivityState::Locked);
    }

    #[test]
    fn test_activities_can_not_be_added_when_approved() {
        let mut period = approved();
        let result =
            period.add_activity(Activity::new(date(1, 4), Decimal::ONE, ActivityType::Sick));
        assert!(matches!(result, Err(ReportingError::IllegalState { .. })));
    }

    #[test]
    fn test_unapprove_reopens_period() {
        let mut period = approved();
        let notifications = period.unapprove(user(), at(), None).unwrap();
        assert_eq!(period.state(), PeriodState::ToBeFilled);
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            period.timeline().day(date(1, 4)).unwrap().allowed_types(),
            ActivityType::ALL.to_vec()
        );
    }

    #[test]
    fn test_deadline_before_finalize_after_is_noop() {
        let mut period = approved();
        let notifications = period.deadline_passed(date(1, 12), None).unwrap();
        assert!(notifications.is_empty());
        assert_eq!(period.state(), PeriodState::Approved);
    }

    #[test]
    fn test_deadline_on_finalize_after_submits() {
        let mut period = approved();
        let notifications = period
            .deadline_passed(date(1, 13), Some("case-1".to_string()))
            .unwrap();
        assert_eq!(period.state(), PeriodState::Submitted);
        assert_eq!(period.case_id(), Some("case-1"));
        assert!(matches!(
            notifications.last(),
            Some(Notification::PeriodSubmitted { case_id: Some(_), .. })
        ));
    }

    #[test]
    fn test_deadline_on_unapproved_period_is_illegal() {
        let mut period = period();
        assert!(matches!(
            period.deadline_passed(date(1, 20), None),
            Err(ReportingError::IllegalState { .. })
        ));
    }

    #[test]
    fn test_manual_submit_bypasses_deadline() {
        let mut period = approved();
        period.manual_submit(None).unwrap();
        assert_eq!(period.state(), PeriodState::Submitted);
    }

    #[test]
    fn test_unsupported_transition_names_operation_and_state() {
        let mut period = approved();
        period.manual_submit(None).unwrap();
        match period.unapprove(user(), at(), None) {
            Err(ReportingError::IllegalState { message }) => {
                assert!(message.contains("unapproval"));
                assert!(message.contains("submitted"));
            }
            other => panic!("Expected IllegalState, got {:?}", other),
        }
    }

    #[test]
    fn test_correction_without_change_can_not_be_approved() {
        let mut original = approved();
        original.manual_submit(None).unwrap();

        let mut correction = ReportingPeriod::correction_of(&original);
        let result = correction.approve(
            ApprovalChange::new(user(), at(), None),
            date(1, 13),
            Some(original.timeline()),
        );
        assert!(matches!(result, Err(ReportingError::IllegalState { .. })));
        assert_eq!(correction.state(), PeriodState::ToBeFilled);
    }
}
