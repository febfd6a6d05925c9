//! Event dispatch: load, apply one event, save.
//!
//! [`EventDispatcher`] is the single writer for person aggregates. Handlers
//! for the same identity are serialized with a per-identity async mutex, so
//! every event sees the state saved by the previous one. A lock is dropped
//! as soon as it is idle, so the lock table only holds identities with work
//! in flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{info, warn};

use crate::error::{ReportingError, ReportingResult};
use crate::events::{DomainEvent, Notification};
use crate::models::FinalizeStrategy;
use crate::person::Person;
use crate::store::PersonRepository;

type IdentityLock = Arc<tokio::sync::Mutex<()>>;

/// Applies domain events to stored persons.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use reporting_engine::dispatch::EventDispatcher;
/// use reporting_engine::events::DomainEvent;
/// use reporting_engine::models::FinalizeStrategy;
/// use reporting_engine::store::InMemoryRepository;
/// use chrono::NaiveDate;
///
/// # #[tokio::main]
/// # async fn main() {
/// let dispatcher = EventDispatcher::new(
///     Arc::new(InMemoryRepository::new()),
///     FinalizeStrategy::default(),
/// );
/// let notifications = dispatcher
///     .dispatch(
///         "12345678901",
///         DomainEvent::DecisionGranted {
///             case_id: "case-1".to_string(),
///             effective_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         },
///     )
///     .await
///     .unwrap();
/// assert_eq!(notifications.len(), 1);
/// # }
/// ```
pub struct EventDispatcher {
    repository: Arc<dyn PersonRepository>,
    strategy: FinalizeStrategy,
    locks: Mutex<HashMap<String, IdentityLock>>,
}

impl EventDispatcher {
    /// Creates a dispatcher over `repository` that opens periods with `strategy`.
    pub fn new(repository: Arc<dyn PersonRepository>, strategy: FinalizeStrategy) -> Self {
        Self {
            repository,
            strategy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The finalize strategy injected into new periods.
    pub fn strategy(&self) -> FinalizeStrategy {
        self.strategy
    }

    /// Loads (or creates) the person, applies `event` and saves the result.
    ///
    /// Nothing is saved when the event is rejected.
    ///
    /// # Errors
    ///
    /// Returns the domain error that rejected the event, or a storage error.
    pub async fn dispatch(
        &self,
        ident: &str,
        event: DomainEvent,
    ) -> ReportingResult<Vec<Notification>> {
        let lock = self.lock_for(ident)?;
        let result = {
            let _guard = lock.lock().await;
            self.apply(ident, event)
        };
        drop(lock);
        self.release(ident);
        result
    }

    /// Loads the person with `ident`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no event was ever dispatched for `ident`.
    pub async fn person(&self, ident: &str) -> ReportingResult<Person> {
        let lock = self.lock_for(ident)?;
        let result = {
            let _guard = lock.lock().await;
            self.repository.load(ident).and_then(|person| {
                person.ok_or_else(|| ReportingError::not_found(format!("person {}", ident)))
            })
        };
        drop(lock);
        self.release(ident);
        result
    }

    fn apply(&self, ident: &str, event: DomainEvent) -> ReportingResult<Vec<Notification>> {
        let started = Instant::now();
        let name = event.name();
        let mut person = self
            .repository
            .load(ident)?
            .unwrap_or_else(|| Person::new(ident));

        match person.handle(event, &self.strategy) {
            Ok(notifications) => {
                self.repository.save(&person)?;
                info!(
                    ident,
                    event = name,
                    notifications = notifications.len(),
                    duration_us = started.elapsed().as_micros() as u64,
                    "event dispatched"
                );
                Ok(notifications)
            }
            Err(error) => {
                warn!(ident, event = name, error = %error, "event rejected");
                Err(error)
            }
        }
    }

    fn lock_for(&self, ident: &str) -> ReportingResult<IdentityLock> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| ReportingError::illegal_state("dispatcher lock table is poisoned"))?;
        Ok(locks.entry(ident.to_string()).or_default().clone())
    }

    // Drops the identity's lock once no caller holds or awaits it. Clones are
    // only handed out under the table lock, so a count of one is final.
    fn release(&self, ident: &str) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        if locks.get(ident).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(ident);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
