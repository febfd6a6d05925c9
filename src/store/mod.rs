//! Persistence of person aggregates.
//!
//! A person is saved and loaded as a whole. [`PersonRecord`] is the
//! row-shaped form used by backends, and [`PersonRepository`] is the seam the
//! dispatcher depends on.

mod record;
mod repository;

pub use record::{ActivityRow, ApprovalRow, DayRow, ObligationRow, PeriodRow, PersonRecord};
pub use repository::{InMemoryRepository, PersonRepository};
