//! Temporal collection: the value in effect as of an instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{ReportingError, ReportingResult};

/// Snapshots of a value keyed by the instant they take effect.
///
/// # Example
///
/// ```
/// use reporting_engine::obligation::TemporalCollection;
/// use chrono::{TimeZone, Utc};
///
/// let mut history = TemporalCollection::new();
/// history.put(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), "first");
/// history.put(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(), "second");
///
/// let mid_january = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
/// assert_eq!(*history.get(mid_january).unwrap(), "first");
/// assert!(history.get(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalCollection<T> {
    snapshots: BTreeMap<DateTime<Utc>, T>,
}

impl<T> Default for TemporalCollection<T> {
    fn default() -> Self {
        Self {
            snapshots: BTreeMap::new(),
        }
    }
}

impl<T> TemporalCollection<T> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a snapshot effective from `at`.
    ///
    /// Overwrites only a snapshot taking effect at exactly the same instant.
    pub fn put(&mut self, at: DateTime<Utc>, value: T) {
        self.snapshots.insert(at, value);
    }

    /// The snapshot with the latest instant at or before `at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if every snapshot takes effect after `at`.
    pub fn get(&self, at: DateTime<Utc>) -> ReportingResult<&T> {
        self.snapshots
            .range(..=at)
            .next_back()
            .map(|(_, value)| value)
            .ok_or_else(|| ReportingError::not_found(format!("snapshot as of {}", at)))
    }

    /// The snapshot taking effect last.
    pub fn latest(&self) -> Option<&T> {
        self.snapshots.values().next_back()
    }

    /// Iterates over snapshots in effective order.
    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Utc>, &T)> {
        self.snapshots.iter()
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if no snapshot exists.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
