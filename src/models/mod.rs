//! Core data models for the Activity Reporting Engine.
//!
//! Leaf first: activities live on days, days form a period's timeline, and
//! periods are kept in a [`PeriodTable`] that owns the correction chains.

mod activity;
mod approval_log;
mod day;
mod finalize;
mod period;
mod periods;
mod timeline;

pub use activity::{Activity, ActivityState, ActivityType};
pub use approval_log::{Actor, ApprovalChange, ApprovalLog, Revocation};
pub use day::{Day, DayPolicy};
pub use finalize::FinalizeStrategy;
pub use period::{PeriodState, ReportingPeriod};
pub use periods::PeriodTable;
pub use timeline::ActivityTimeline;
