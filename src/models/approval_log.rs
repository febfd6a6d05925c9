//! Approval log: append-only approval and unapproval history of a period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ReportingError, ReportingResult};

/// Who performed an approval or unapproval.
///
/// # Example
///
/// ```
/// use reporting_engine::models::Actor;
///
/// let actor = Actor::EndUser { ident: "12345678901".to_string() };
/// assert_eq!(actor.to_string(), "end user '12345678901'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// The person reporting, identified by their identity string.
    EndUser {
        /// The person's identity.
        ident: String,
    },
    /// A case worker acting on behalf of the authority.
    CaseWorker {
        /// The case worker's identifier.
        id: String,
    },
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::EndUser { ident } => write!(f, "end user '{}'", ident),
            Actor::CaseWorker { id } => write!(f, "case worker '{}'", id),
        }
    }
}

/// The record of an approval being revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    /// Unique identifier for the revocation.
    pub id: Uuid,
    /// Who revoked the approval.
    pub actor: Actor,
    /// When the approval was revoked.
    pub at: DateTime<Utc>,
    /// Optional free-text justification.
    pub justification: Option<String>,
}

/// A single approval entry in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalChange {
    /// Unique identifier for the approval.
    pub id: Uuid,
    /// Who approved.
    pub actor: Actor,
    /// When the approval happened.
    pub at: DateTime<Utc>,
    /// Optional free-text justification.
    pub justification: Option<String>,
    /// The revocation of this approval, if any.
    pub revoked_by: Option<Revocation>,
}

impl ApprovalChange {
    /// Creates a new, live approval.
    pub fn new(actor: Actor, at: DateTime<Utc>, justification: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor,
            at,
            justification,
            revoked_by: None,
        }
    }

    /// Returns true if the approval has not been revoked.
    pub fn is_live(&self) -> bool {
        self.revoked_by.is_none()
    }
}

/// Ordered, append-only list of approvals.
///
/// Only the most recent entry can be live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalLog {
    entries: Vec<ApprovalChange>,
}

impl ApprovalLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from stored entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if any entry but the last is live.
    pub fn from_entries(entries: Vec<ApprovalChange>) -> ReportingResult<Self> {
        let len = entries.len();
        if entries
            .iter()
            .take(len.saturating_sub(1))
            .any(ApprovalChange::is_live)
        {
            return Err(ReportingError::illegal_state(
                "only the latest approval may be live",
            ));
        }
        Ok(Self { entries })
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[ApprovalChange] {
        &self.entries
    }

    /// Returns true iff the latest entry exists and is not revoked.
    pub fn is_approved(&self) -> bool {
        self.entries.last().is_some_and(ApprovalChange::is_live)
    }

    /// Appends a new approval.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if a live approval already exists.
    pub fn add(&mut self, change: ApprovalChange) -> ReportingResult<()> {
        if self.is_approved() {
            return Err(ReportingError::illegal_state(
                "the period already has a live approval",
            ));
        }
        self.entries.push(change);
        Ok(())
    }

    /// Checks that `actor` may revoke the live approval, without mutating.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` if nothing is live, or `Unauthorized` if an end
    /// user tries to revoke an approval they did not author.
    pub fn ensure_revocable_by(&self, actor: &Actor) -> ReportingResult<()> {
        let live = self
            .entries
            .last()
            .filter(|e| e.is_live())
            .ok_or_else(|| ReportingError::illegal_state("there is no live approval to revoke"))?;

        match actor {
            Actor::CaseWorker { .. } => Ok(()),
            Actor::EndUser { .. } if *actor == live.actor => Ok(()),
            Actor::EndUser { .. } => Err(ReportingError::Unauthorized {
                actor: actor.to_string(),
                message: format!("may not revoke an approval made by {}", live.actor),
            }),
        }
    }

    /// Revokes the live approval.
    ///
    /// # Errors
    ///
    /// See [`ApprovalLog::ensure_revocable_by`].
    pub fn revoke(
        &mut self,
        actor: Actor,
        at: DateTime<Utc>,
        justification: Option<String>,
    ) -> ReportingResult<()> {
        self.ensure_revocable_by(&actor)?;
        if let Some(live) = self.entries.last_mut() {
            live.revoked_by = Some(Revocation {
                id: Uuid::new_v4(),
                actor,
                at,
                justification,
            });
        }
        Ok(())
    }
}
