//! Row-shaped representation of a person for persistence.
//!
//! A [`PersonRecord`] is what a relational backend would upsert: one row per
//! obligation snapshot, period, approval entry, day and activity, each keyed
//! by a stable identifier. Correction chains are plain nullable links and are
//! validated when the person is rebuilt.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReportingError, ReportingResult};
use crate::models::{
    Activity, ActivityState, ActivityTimeline, ActivityType, Actor, ApprovalChange, ApprovalLog,
    Day, DayPolicy, PeriodState, PeriodTable, ReportingPeriod, Revocation,
};
use crate::obligation::{ObligationKind, ReportingObligation};
use crate::person::Person;

/// One obligation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationRow {
    /// Snapshot id.
    pub id: Uuid,
    /// `none`, `application_based` or `decision_based`.
    pub kind: String,
    /// Set for decision-based snapshots.
    pub case_id: Option<String>,
    /// When the snapshot takes effect.
    pub effective_from: DateTime<Utc>,
}

/// One reporting period, superseded ones included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRow {
    /// Period id.
    pub id: Uuid,
    /// First date.
    pub start: NaiveDate,
    /// Last date.
    pub end: NaiveDate,
    /// Approval gate.
    pub approvable_from: NaiveDate,
    /// Deadline submission date.
    pub finalize_after: NaiveDate,
    /// Lifecycle state.
    pub state: PeriodState,
    /// The period this one corrects.
    pub corrects: Option<Uuid>,
    /// The period correcting this one.
    pub corrected_by: Option<Uuid>,
    /// Case id stamped at submission.
    pub case_id: Option<String>,
}

/// One approval log entry. `position` keeps the log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRow {
    /// Entry id.
    pub id: Uuid,
    /// Owning period.
    pub period_id: Uuid,
    /// Index in the log.
    pub position: usize,
    /// Who approved.
    pub actor: Actor,
    /// When the approval happened.
    pub at: DateTime<Utc>,
    /// Optional justification.
    pub justification: Option<String>,
    /// The revocation, if any.
    pub revoked_by: Option<Revocation>,
}

/// One day of a period's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRow {
    /// Owning period.
    pub period_id: Uuid,
    /// The date.
    pub date: NaiveDate,
    /// Current policy.
    pub policy: DayPolicy,
    /// Excluded from reporting.
    pub exempt: bool,
}

/// One activity, deleted ones included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRow {
    /// Activity id.
    pub id: Uuid,
    /// Owning period.
    pub period_id: Uuid,
    /// The date.
    pub date: NaiveDate,
    /// Duration in hours.
    pub hours: Decimal,
    /// Kind of activity.
    pub activity_type: ActivityType,
    /// Lifecycle state.
    pub state: ActivityState,
}

/// The full, flattened state of one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Identity of the person.
    pub ident: String,
    /// Obligation history.
    pub obligations: Vec<ObligationRow>,
    /// Every period.
    pub periods: Vec<PeriodRow>,
    /// Every approval entry.
    pub approvals: Vec<ApprovalRow>,
    /// Every day of every period.
    pub days: Vec<DayRow>,
    /// Every activity.
    pub activities: Vec<ActivityRow>,
}

impl ObligationRow {
    fn from_obligation(obligation: &ReportingObligation) -> Self {
        let (kind, case_id) = match &obligation.kind {
            ObligationKind::None => ("none", None),
            ObligationKind::ApplicationBased => ("application_based", None),
            ObligationKind::DecisionBased { case_id } => ("decision_based", Some(case_id.clone())),
        };
        Self {
            id: obligation.id,
            kind: kind.to_string(),
            case_id,
            effective_from: obligation.effective_from,
        }
    }

    fn into_obligation(self) -> ReportingResult<ReportingObligation> {
        let kind = match (self.kind.as_str(), self.case_id) {
            ("none", _) => ObligationKind::None,
            ("application_based", _) => ObligationKind::ApplicationBased,
            ("decision_based", Some(case_id)) => ObligationKind::DecisionBased { case_id },
            (kind, _) => {
                return Err(ReportingError::illegal_state(format!(
                    "obligation {} has invalid kind '{}'",
                    self.id, kind
                )));
            }
        };
        Ok(ReportingObligation {
            id: self.id,
            kind,
            effective_from: self.effective_from,
        })
    }
}

impl Person {
    /// Flattens the person into rows.
    ///
    /// # Example
    ///
    /// ```
    /// use reporting_engine::events::DomainEvent;
    /// use reporting_engine::models::FinalizeStrategy;
    /// use reporting_engine::person::Person;
    /// use chrono::NaiveDate;
    ///
    /// let mut person = Person::new("12345678901");
    /// person.handle(
    ///     DomainEvent::DecisionGranted {
    ///         case_id: "case-1".to_string(),
    ///         effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     },
    ///     &FinalizeStrategy::default(),
    /// ).unwrap();
    ///
    /// let record = person.to_record();
    /// assert_eq!(record.periods.len(), 1);
    /// assert_eq!(record.days.len(), 14);
    /// assert_eq!(Person::from_record(record).unwrap(), person);
    /// ```
    pub fn to_record(&self) -> PersonRecord {
        let mut record = PersonRecord {
            ident: self.ident().to_string(),
            obligations: self
                .obligations()
                .iter()
                .map(|(_, obligation)| ObligationRow::from_obligation(obligation))
                .collect(),
            periods: Vec::new(),
            approvals: Vec::new(),
            days: Vec::new(),
            activities: Vec::new(),
        };

        for period in self.periods().iter() {
            record.periods.push(PeriodRow {
                id: period.id,
                start: period.start,
                end: period.end,
                approvable_from: period.approvable_from,
                finalize_after: period.finalize_after,
                state: period.state,
                corrects: period.corrects,
                corrected_by: period.corrected_by,
                case_id: period.case_id.clone(),
            });
            record
                .approvals
                .extend(period.approvals.entries().iter().enumerate().map(
                    |(position, change)| ApprovalRow {
                        id: change.id,
                        period_id: period.id,
                        position,
                        actor: change.actor.clone(),
                        at: change.at,
                        justification: change.justification.clone(),
                        revoked_by: change.revoked_by.clone(),
                    },
                ));
            for day in period.timeline.days() {
                record.days.push(DayRow {
                    period_id: period.id,
                    date: day.date,
                    policy: day.policy,
                    exempt: day.exempt,
                });
                record
                    .activities
                    .extend(day.activities.iter().map(|activity| ActivityRow {
                        id: activity.id,
                        period_id: period.id,
                        date: activity.date,
                        hours: activity.hours,
                        activity_type: activity.activity_type,
                        state: activity.state,
                    }));
            }
        }
        record
    }

    /// Rebuilds a person from rows.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` for rows that reference unknown periods or days,
    /// duplicate ids, malformed timelines or approval logs, and broken
    /// correction chains.
    pub fn from_record(record: PersonRecord) -> ReportingResult<Person> {
        let PersonRecord {
            ident,
            obligations,
            periods,
            approvals,
            days,
            activities,
        } = record;

        let obligations = obligations
            .into_iter()
            .map(ObligationRow::into_obligation)
            .collect::<ReportingResult<Vec<_>>>()?;

        let period_ids: Vec<Uuid> = periods.iter().map(|p| p.id).collect();
        let mut days_by_period: HashMap<Uuid, BTreeMap<NaiveDate, Day>> = HashMap::new();
        for row in days {
            let day = Day {
                date: row.date,
                activities: Vec::new(),
                policy: row.policy,
                exempt: row.exempt,
            };
            if days_by_period
                .entry(row.period_id)
                .or_default()
                .insert(row.date, day)
                .is_some()
            {
                return Err(ReportingError::illegal_state(format!(
                    "period {} has more than one day row for {}",
                    row.period_id, row.date
                )));
            }
        }

        for row in activities {
            let day = days_by_period
                .get_mut(&row.period_id)
                .and_then(|days| days.get_mut(&row.date))
                .ok_or_else(|| {
                    ReportingError::illegal_state(format!(
                        "activity {} references unknown day {} of period {}",
                        row.id, row.date, row.period_id
                    ))
                })?;
            day.activities.push(Activity {
                id: row.id,
                date: row.date,
                hours: row.hours,
                activity_type: row.activity_type,
                state: row.state,
            });
        }

        let mut approvals_by_period: HashMap<Uuid, Vec<ApprovalRow>> = HashMap::new();
        for row in approvals {
            approvals_by_period.entry(row.period_id).or_default().push(row);
        }

        let mut table = PeriodTable::new();
        for row in periods {
            let days = days_by_period
                .remove(&row.id)
                .map(|days| days.into_values().collect())
                .unwrap_or_default();
            let timeline = ActivityTimeline::from_days(days)?;
            if timeline.days().first().map(|d| d.date) != Some(row.start) {
                return Err(ReportingError::illegal_state(format!(
                    "timeline of period {} does not start on {}",
                    row.id, row.start
                )));
            }

            let mut entries = approvals_by_period.remove(&row.id).unwrap_or_default();
            entries.sort_by_key(|entry| entry.position);
            let approvals = ApprovalLog::from_entries(
                entries
                    .into_iter()
                    .map(|entry| ApprovalChange {
                        id: entry.id,
                        actor: entry.actor,
                        at: entry.at,
                        justification: entry.justification,
                        revoked_by: entry.revoked_by,
                    })
                    .collect(),
            )?;

            table.insert(ReportingPeriod {
                id: row.id,
                start: row.start,
                end: row.end,
                approvable_from: row.approvable_from,
                finalize_after: row.finalize_after,
                state: row.state,
                timeline,
                approvals,
                corrects: row.corrects,
                corrected_by: row.corrected_by,
                case_id: row.case_id,
            })?;
        }

        if let Some(orphan) = days_by_period
            .keys()
            .chain(approvals_by_period.keys())
            .find(|id| !period_ids.contains(id))
        {
            return Err(ReportingError::illegal_state(format!(
                "rows reference unknown period {}",
                orphan
            )));
        }

        Person::from_parts(ident, obligations, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DomainEvent, start_of_day};
    use crate::models::FinalizeStrategy;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn person_with_correction() -> (Person, Uuid) {
        let strategy = FinalizeStrategy::default();
        let mut person = Person::new("12345678901");
        let period_id = person
            .handle(
                DomainEvent::DecisionGranted {
                    case_id: "case-1".to_string(),
                    effective_date: date(1, 1),
                },
                &strategy,
            )
            .unwrap()[0]
            .period_id()
            .unwrap();
        let events = vec![
            DomainEvent::AddActivity {
                period_id,
                date: date(1, 3),
                hours: Decimal::new(75, 1),
                activity_type: ActivityType::Work,
            },
            DomainEvent::Approve {
                period_id,
                actor: Actor::EndUser {
                    ident: "12345678901".to_string(),
                },
                reference_date: date(1, 13),
                at: start_of_day(date(1, 13)),
                justification: None,
            },
            DomainEvent::DeadlinePassed { date: date(1, 13) },
            DomainEvent::Correct { period_id },
        ];
        for event in events {
            person.handle(event, &strategy).unwrap();
        }
        (person, period_id)
    }

    #[test]
    fn test_record_round_trip_preserves_chains() {
        let (person, period_id) = person_with_correction();
        let record = person.to_record();
        assert_eq!(record.periods.len(), 2);
        assert_eq!(record.approvals.len(), 1);
        assert_eq!(record.activities.len(), 2);
        assert_eq!(record.obligations.len(), 2);

        let restored = Person::from_record(record).unwrap();
        assert_eq!(restored, person);
        assert_ne!(restored.latest_correction(period_id).unwrap().id(), period_id);
    }

    #[test]
    fn test_record_survives_json() {
        let (person, _) = person_with_correction();
        let json = serde_json::to_string(&person.to_record()).unwrap();
        let record: PersonRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(Person::from_record(record).unwrap(), person);
    }

    #[test]
    fn test_dangling_chain_link_is_rejected() {
        let (person, period_id) = person_with_correction();
        let mut record = person.to_record();
        for row in &mut record.periods {
            if row.id == period_id {
                row.corrected_by = Some(Uuid::new_v4());
            }
        }
        assert!(matches!(
            Person::from_record(record),
            Err(ReportingError::IllegalState { .. })
        ));
    }

    #[test]
    fn test_missing_day_rows_are_rejected() {
        let (person, _) = person_with_correction();
        let mut record = person.to_record();
        record.days.pop();
        assert!(Person::from_record(record).is_err());
    }

    #[test]
    fn test_orphan_activity_is_rejected() {
        let (person, _) = person_with_correction();
        let mut record = person.to_record();
        record.activities[0].period_id = Uuid::new_v4();
        assert!(Person::from_record(record).is_err());
    }

    #[test]
    fn test_unknown_obligation_kind_is_rejected() {
        let (person, _) = person_with_correction();
        let mut record = person.to_record();
        record.obligations[0].kind = "maybe".to_string();
        assert!(Person::from_record(record).is_err());
    }
}
