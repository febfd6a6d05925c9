//! Error types for the Activity Reporting Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every rule the domain state machine can reject.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the Activity Reporting Engine.
///
/// Every operation on the domain aggregate returns this error type. A failed
/// operation never leaves a partially applied event behind.
///
/// # Example
///
/// ```
/// use reporting_engine::error::ReportingError;
///
/// let error = ReportingError::IllegalState {
///     message: "cannot approve a submitted period".to_string(),
/// };
/// assert_eq!(error.to_string(), "Illegal state: cannot approve a submitted period");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportingError {
    /// A lookup found nothing (temporal snapshot, period or activity).
    #[error("Not found: {what}")]
    NotFound {
        /// Description of what was looked up.
        what: String,
    },

    /// An approval was attempted before the period may be approved.
    #[error("Period can not be approved before {approvable_from} (attempted {attempted})")]
    GateTooEarly {
        /// The earliest date the period may be approved.
        approvable_from: NaiveDate,
        /// The reference date of the rejected approval.
        attempted: NaiveDate,
    },

    /// The event is not valid in the current state, or violates a day rule.
    #[error("Illegal state: {message}")]
    IllegalState {
        /// The violated rule.
        message: String,
    },

    /// The actor is not allowed to perform the operation.
    #[error("Unauthorized {actor}: {message}")]
    Unauthorized {
        /// The actor that attempted the operation.
        actor: String,
        /// Why the actor was rejected.
        message: String,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl ReportingError {
    /// Shorthand for an [`ReportingError::IllegalState`] error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Shorthand for a [`ReportingError::NotFound`] error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

/// A type alias for Results that return ReportingError.
pub type ReportingResult<T> = Result<T, ReportingError>;
