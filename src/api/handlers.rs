//! HTTP request handlers for the Activity Reporting Engine API.
//!
//! This module contains the handler functions for all API endpoints.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::events::DomainEvent;

use super::request::{PeriodPath, PersonPath};
use super::response::{
    ApiError, ApiErrorResponse, EventResponse, PeriodListResponse, PeriodSummary,
};
use super::state::AppState;

/// Creates the API router.
///
/// # Routes
///
/// - `POST /persons/:ident/events` applies one domain event
/// - `GET /persons/:ident/periods` lists every period of the person
/// - `GET /persons/:ident/periods/:id/latest` resolves the newest correction
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use reporting_engine::api::{create_router, AppState};
/// use reporting_engine::config::ConfigLoader;
/// use reporting_engine::store::InMemoryRepository;
///
/// let state = AppState::new(ConfigLoader::default(), Arc::new(InMemoryRepository::new()));
/// let router = create_router(state);
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/persons/:ident/events", post(event_handler))
        .route("/persons/:ident/periods", get(periods_handler))
        .route(
            "/persons/:ident/periods/:id/latest",
            get(latest_correction_handler),
        )
        .with_state(state)
}

async fn event_handler(
    State(state): State<AppState>,
    path: Result<Path<PersonPath>, PathRejection>,
    payload: Result<Json<DomainEvent>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();

    let ident = match path {
        Ok(Path(PersonPath { ident })) => ident,
        Err(rejection) => return path_error(correlation_id, rejection),
    };

    let event = match payload {
        Ok(Json(event)) => event,
        Err(rejection) => return json_error(correlation_id, rejection),
    };

    info!(
        correlation_id = %correlation_id,
        ident = %ident,
        event = event.name(),
        "Processing event"
    );

    match state.dispatcher().dispatch(&ident, event).await {
        Ok(notifications) => {
            info!(
                correlation_id = %correlation_id,
                notifications = notifications.len(),
                "Event applied"
            );
            (
                StatusCode::OK,
                Json(EventResponse {
                    correlation_id,
                    notifications,
                }),
            )
                .into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Event rejected");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

async fn periods_handler(
    State(state): State<AppState>,
    path: Result<Path<PersonPath>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let ident = match path {
        Ok(Path(PersonPath { ident })) => ident,
        Err(rejection) => return path_error(correlation_id, rejection),
    };

    match state.dispatcher().person(&ident).await {
        Ok(person) => {
            let mut periods: Vec<PeriodSummary> =
                person.periods().iter().map(PeriodSummary::from).collect();
            periods.sort_by_key(|p| (p.start, p.corrects.is_some()));
            Json(PeriodListResponse { ident, periods }).into_response()
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Period listing failed");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

async fn latest_correction_handler(
    State(state): State<AppState>,
    path: Result<Path<PeriodPath>, PathRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let PeriodPath { ident, id } = match path {
        Ok(Path(path)) => path,
        Err(rejection) => return path_error(correlation_id, rejection),
    };

    let result = state
        .dispatcher()
        .person(&ident)
        .await
        .and_then(|person| person.latest_correction(id).cloned());

    match result {
        Ok(period) => Json(period).into_response(),
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                period_id = %id,
                error = %err,
                "Latest correction lookup failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}

fn json_error(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::bad_request(error).into_response()
}

fn path_error(correlation_id: Uuid, rejection: PathRejection) -> Response {
    let message = rejection.body_text();
    warn!(correlation_id = %correlation_id, error = %message, "Invalid path");
    ApiErrorResponse::bad_request(ApiError::validation_error(message)).into_response()
}
