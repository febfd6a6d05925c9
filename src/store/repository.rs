//! Storage abstraction for person aggregates.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{ReportingError, ReportingResult};
use crate::person::Person;

use super::record::PersonRecord;

/// Loads and saves whole person aggregates.
///
/// `save` writes the full aggregate as one unit, upserting by identity.
/// Implementations must be shareable across the dispatcher's tasks.
pub trait PersonRepository: Send + Sync {
    /// Loads the person with `ident`, or `None` if it was never saved.
    fn load(&self, ident: &str) -> ReportingResult<Option<Person>>;

    /// Saves the person, replacing any stored state for its identity.
    fn save(&self, person: &Person) -> ReportingResult<()>;
}

/// A repository that keeps [`PersonRecord`]s in memory.
///
/// Persons go through the same row conversion a relational backend would
/// use, so chain validation runs on every load.
///
/// # Example
///
/// ```
/// use reporting_engine::person::Person;
/// use reporting_engine::store::{InMemoryRepository, PersonRepository};
///
/// let repository = InMemoryRepository::new();
/// repository.save(&Person::new("12345678901")).unwrap();
///
/// let loaded = repository.load("12345678901").unwrap().unwrap();
/// assert_eq!(loaded.ident(), "12345678901");
/// assert!(repository.load("someone else").unwrap().is_none());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: RwLock<HashMap<String, PersonRecord>>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored record for `ident`.
    pub fn record(&self, ident: &str) -> ReportingResult<Option<PersonRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(ident).cloned())
    }

    /// Number of stored persons.
    pub fn count(&self) -> ReportingResult<usize> {
        Ok(self.records.read().map_err(|_| poisoned())?.len())
    }
}

impl PersonRepository for InMemoryRepository {
    fn load(&self, ident: &str) -> ReportingResult<Option<Person>> {
        self.record(ident)?.map(Person::from_record).transpose()
    }

    fn save(&self, person: &Person) -> ReportingResult<()> {
        let record = person.to_record();
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(record.ident.clone(), record);
        Ok(())
    }
}

fn poisoned() -> ReportingError {
    ReportingError::illegal_state("person repository lock is poisoned")
}
