//! Flat, id-keyed table of every period a person owns.
//!
//! Correction chains are stored as `corrects` / `corrected_by` links between
//! entries of the table. Every walk along a chain is iterative and bounded by
//! the number of periods, so a corrupted chain is reported as an error rather
//! than looping forever.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calendar::{monday_on_or_before, shift_days};
use crate::error::{ReportingError, ReportingResult};
use crate::events::Notification;

use super::activity::Activity;
use super::approval_log::{Actor, ApprovalChange};
use super::finalize::FinalizeStrategy;
use super::period::{PeriodState, ReportingPeriod};

/// Every period owned by a person, including superseded corrections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodTable {
    periods: BTreeMap<Uuid, ReportingPeriod>,
}

impl PeriodTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of periods, superseded ones included.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Returns true if the table holds no periods.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Iterates over every period in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ReportingPeriod> {
        self.periods.values()
    }

    /// Adds a period.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if a period with the same id already exists.
    pub fn insert(&mut self, period: ReportingPeriod) -> ReportingResult<()> {
        if self.periods.contains_key(&period.id) {
            return Err(ReportingError::illegal_state(format!(
                "period {} already exists",
                period.id
            )));
        }
        self.periods.insert(period.id, period);
        Ok(())
    }

    /// Looks up a period by id.
    pub fn get(&self, id: Uuid) -> ReportingResult<&ReportingPeriod> {
        self.periods
            .get(&id)
            .ok_or_else(|| ReportingError::not_found(format!("period {}", id)))
    }

    fn get_mut(&mut self, id: Uuid) -> ReportingResult<&mut ReportingPeriod> {
        self.periods
            .get_mut(&id)
            .ok_or_else(|| ReportingError::not_found(format!("period {}", id)))
    }

    /// Follows `corrected_by` from `id` to the newest correction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown or dangling id, and `IllegalState`
    /// if the links form a cycle.
    pub fn tip_id(&self, id: Uuid) -> ReportingResult<Uuid> {
        let mut current = self.get(id)?;
        for _ in 0..=self.periods.len() {
            match current.corrected_by {
                Some(next) => current = self.get(next)?,
                None => return Ok(current.id),
            }
        }
        Err(cycle(id))
    }

    /// Follows `corrects` from `id` back to the original period.
    pub fn root_id(&self, id: Uuid) -> ReportingResult<Uuid> {
        let mut current = self.get(id)?;
        for _ in 0..=self.periods.len() {
            match current.corrects {
                Some(previous) => current = self.get(previous)?,
                None => return Ok(current.id),
            }
        }
        Err(cycle(id))
    }

    /// The newest correction in the chain `id` belongs to.
    ///
    /// Any id in the chain, superseded drafts included, resolves to the same
    /// period.
    pub fn latest_correction(&self, id: Uuid) -> ReportingResult<&ReportingPeriod> {
        self.get(self.tip_id(id)?)
    }

    /// Original periods, ordered by start date.
    pub fn roots(&self) -> Vec<&ReportingPeriod> {
        let mut roots: Vec<&ReportingPeriod> =
            self.periods.values().filter(|p| p.corrects.is_none()).collect();
        roots.sort_by_key(|p| p.start);
        roots
    }

    /// The main path of the chain starting at `root_id`, oldest first.
    ///
    /// Drafts that were replaced by a restarted correction are not part of
    /// the main path.
    pub fn chain(&self, root_id: Uuid) -> ReportingResult<Vec<&ReportingPeriod>> {
        let mut chain = vec![self.get(root_id)?];
        for _ in 0..self.periods.len() {
            let current = chain[chain.len() - 1];
            match current.corrected_by {
                Some(next) => chain.push(self.get(next)?),
                None => return Ok(chain),
            }
        }
        Err(cycle(root_id))
    }

    /// Checks that every chain is well formed.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` for dangling links, cycles, and main paths whose
    /// back links disagree with their forward links.
    pub fn validate(&self) -> ReportingResult<()> {
        for period in self.periods.values() {
            for link in [period.corrects, period.corrected_by].into_iter().flatten() {
                if !self.periods.contains_key(&link) {
                    return Err(ReportingError::illegal_state(format!(
                        "period {} links to unknown period {}",
                        period.id, link
                    )));
                }
            }
            if period.corrects == Some(period.id) || period.corrected_by == Some(period.id) {
                return Err(cycle(period.id));
            }
            self.tip_id(period.id)?;
            self.root_id(period.id)?;
        }

        for root in self.roots() {
            let chain = self.chain(root.id)?;
            for pair in chain.windows(2) {
                if pair[1].corrects != Some(pair[0].id) {
                    return Err(ReportingError::illegal_state(format!(
                        "period {} is corrected by {} which does not correct it",
                        pair[0].id, pair[1].id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Creates the first period of an obligation starting on
    /// `obligation_start`, unless one already covers it.
    pub(crate) fn open_first_period(
        &mut self,
        obligation_start: NaiveDate,
        strategy: &FinalizeStrategy,
    ) -> ReportingResult<Vec<Notification>> {
        let start = monday_on_or_before(obligation_start)?;
        if self.roots().iter().any(|p| p.end >= start) {
            debug!(%start, "first period already exists");
            return Ok(Vec::new());
        }
        let notification = self.open_period(start, obligation_start, strategy)?;
        Ok(vec![notification])
    }

    /// Creates the next sequential period if it starts on or before `date`.
    ///
    /// Days before `obligated_since` are exempt in the new period.
    pub(crate) fn open_next_period(
        &mut self,
        obligated_since: NaiveDate,
        date: NaiveDate,
        strategy: &FinalizeStrategy,
    ) -> ReportingResult<Vec<Notification>> {
        let start = match self.roots().last() {
            Some(last) => shift_days(last.end, 1)?,
            None => monday_on_or_before(obligated_since)?,
        };
        if start > date {
            debug!(%date, next_start = %start, "no period due for the new cycle");
            return Ok(Vec::new());
        }
        let notification = self.open_period(start, obligated_since, strategy)?;
        Ok(vec![notification])
    }

    fn open_period(
        &mut self,
        start: NaiveDate,
        obligated_since: NaiveDate,
        strategy: &FinalizeStrategy,
    ) -> ReportingResult<Notification> {
        let mut period = ReportingPeriod::new(start, strategy)?;
        let end = period.end;
        let exempt: Vec<NaiveDate> = start
            .iter_days()
            .take_while(|date| *date < obligated_since && *date <= end)
            .collect();
        for date in exempt {
            period.timeline.mark_exempt(date)?;
        }

        info!(
            period_id = %period.id,
            start = %period.start,
            end = %period.end,
            finalize_after = %period.finalize_after,
            "period created"
        );
        let notification = period.state_changed(None);
        self.insert(period)?;
        Ok(notification)
    }

    /// Adds an activity to the newest correction of the chain.
    pub(crate) fn add_activity(&mut self, id: Uuid, activity: Activity) -> ReportingResult<()> {
        let tip = self.tip_id(id)?;
        self.get_mut(tip)?.add_activity(activity)
    }

    /// Deletes an activity from the newest correction of the chain.
    pub(crate) fn delete_activity(&mut self, id: Uuid, activity_id: Uuid) -> ReportingResult<()> {
        let tip = self.tip_id(id)?;
        self.get_mut(tip)?.delete_activity(activity_id)
    }

    /// Approves the newest correction of the chain.
    pub(crate) fn approve(
        &mut self,
        id: Uuid,
        change: ApprovalChange,
        reference_date: NaiveDate,
    ) -> ReportingResult<Vec<Notification>> {
        let tip = self.tip_id(id)?;
        let corrected = match self.get(tip)?.corrects {
            Some(original) => Some(self.get(original)?.timeline.clone()),
            None => None,
        };
        let notifications =
            self.get_mut(tip)?
                .approve(change, reference_date, corrected.as_ref())?;
        info!(period_id = %tip, "period approved");
        Ok(notifications)
    }

    /// Revokes the approval of the newest correction of the chain.
    pub(crate) fn unapprove(
        &mut self,
        id: Uuid,
        actor: Actor,
        at: DateTime<Utc>,
        justification: Option<String>,
    ) -> ReportingResult<Vec<Notification>> {
        let tip = self.tip_id(id)?;
        let notifications = self.get_mut(tip)?.unapprove(actor, at, justification)?;
        info!(period_id = %tip, "period unapproved");
        Ok(notifications)
    }

    /// Submits the newest correction of the chain without waiting for the deadline.
    pub(crate) fn manual_submit(
        &mut self,
        id: Uuid,
        case_id: Option<String>,
    ) -> ReportingResult<Vec<Notification>> {
        let tip = self.tip_id(id)?;
        let notifications = self.get_mut(tip)?.manual_submit(case_id)?;
        info!(period_id = %tip, "period submitted manually");
        Ok(notifications)
    }

    /// Starts, or restarts, a correction of the chain `id` belongs to.
    ///
    /// A submitted tip gets a new correction copied from its timeline. A
    /// correction that is still being filled is replaced by a new one copied
    /// from the period it corrects; the replaced draft links forward to its
    /// replacement.
    pub(crate) fn correct(&mut self, id: Uuid) -> ReportingResult<Vec<Notification>> {
        let tip_id = self.tip_id(id)?;
        let tip = self.get(tip_id)?;

        let (correction, replaced) = match (tip.state, tip.corrects) {
            (PeriodState::Submitted, _) => (ReportingPeriod::correction_of(tip), None),
            (PeriodState::ToBeFilled, Some(original)) => {
                (ReportingPeriod::correction_of(self.get(original)?), Some(tip_id))
            }
            _ => return Err(tip.unsupported("correction")),
        };

        let correction_id = correction.id;
        let corrected = correction.corrects.unwrap_or(tip_id);
        let notification = correction.state_changed(None);
        self.insert(correction)?;
        self.get_mut(corrected)?.corrected_by = Some(correction_id);
        if let Some(replaced) = replaced {
            self.get_mut(replaced)?.corrected_by = Some(correction_id);
        }

        info!(
            period_id = %correction_id,
            corrects = %corrected,
            restarted = replaced.is_some(),
            "correction created"
        );
        Ok(vec![notification])
    }

    /// Submits every approved tip whose chain starts on or before `date` and
    /// whose finalize-after date has been reached.
    pub(crate) fn submit_due(
        &mut self,
        date: NaiveDate,
        case_id: Option<&str>,
    ) -> ReportingResult<Vec<Notification>> {
        let roots: Vec<Uuid> = self
            .roots()
            .into_iter()
            .filter(|p| p.start <= date)
            .map(|p| p.id)
            .collect();

        let mut notifications = Vec::new();
        for root in roots {
            let tip = self.tip_id(root)?;
            let period = self.get_mut(tip)?;
            if period.state != PeriodState::Approved {
                continue;
            }
            let submitted = period.deadline_passed(date, case_id.map(str::to_string))?;
            if !submitted.is_empty() {
                info!(period_id = %tip, case_id = ?case_id, "period submitted by deadline");
            }
            notifications.extend(submitted);
        }
        Ok(notifications)
    }
}

fn cycle(id: Uuid) -> ReportingError {
    ReportingError::illegal_state(format!("correction chain of period {} forms a cycle", id))
}
