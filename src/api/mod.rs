//! HTTP API module for the Activity Reporting Engine.
//!
//! This module exposes the event dispatcher over REST: events are posted
//! per person, and periods can be listed or resolved to their newest
//! correction.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{PeriodPath, PersonPath};
pub use response::{ApiError, ApiErrorResponse, EventResponse, PeriodListResponse, PeriodSummary};
pub use state::AppState;
