//! Request types for the Activity Reporting Engine API.
//!
//! Event bodies are plain [`DomainEvent`](crate::events::DomainEvent) JSON.
//! This module defines the path parameters the routes extract.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Path parameters of `/persons/{ident}/...` routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonPath {
    /// The person's identity.
    pub ident: String,
}

/// Path parameters of `/persons/{ident}/periods/{id}/...` routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodPath {
    /// The person's identity.
    pub ident: String,
    /// Any period id in the chain.
    pub id: Uuid,
}
