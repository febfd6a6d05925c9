//! Application state for the Activity Reporting Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::dispatch::EventDispatcher;
use crate::store::PersonRepository;

/// Shared application state.
///
/// Holds the loaded configuration and the dispatcher every handler writes
/// through.
#[derive(Clone)]
pub struct AppState {
    /// The loaded engine configuration.
    config: Arc<ConfigLoader>,
    /// The single writer for person aggregates.
    dispatcher: Arc<EventDispatcher>,
}

impl AppState {
    /// Creates the application state over `repository`, opening new periods
    /// with the configured finalize strategy.
    pub fn new(config: ConfigLoader, repository: Arc<dyn PersonRepository>) -> Self {
        let dispatcher = EventDispatcher::new(repository, config.finalize_strategy());
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the event dispatcher.
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }
}
