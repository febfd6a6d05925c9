//! Response types for the Activity Reporting Engine API.
//!
//! This module defines the success payloads, the error response structure,
//! and the mapping from domain errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReportingError;
use crate::events::Notification;
use crate::models::{PeriodState, ReportingPeriod};

/// Response body of `POST /persons/{ident}/events`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    /// Identifier of the request, also present in the logs.
    pub correlation_id: Uuid,
    /// Notifications emitted by the event, in order.
    pub notifications: Vec<Notification>,
}

/// One period in `GET /persons/{ident}/periods`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Period id.
    pub id: Uuid,
    /// First date.
    pub start: NaiveDate,
    /// Last date.
    pub end: NaiveDate,
    /// Current state.
    pub state: PeriodState,
    /// Earliest approval reference date.
    pub approvable_from: NaiveDate,
    /// Date from which the deadline submits the period.
    pub finalize_after: NaiveDate,
    /// True if the period holds a live approval.
    pub approved: bool,
    /// The period this one corrects.
    pub corrects: Option<Uuid>,
    /// The period correcting this one.
    pub corrected_by: Option<Uuid>,
    /// The case id stamped at submission.
    pub case_id: Option<String>,
}

impl From<&ReportingPeriod> for PeriodSummary {
    fn from(period: &ReportingPeriod) -> Self {
        Self {
            id: period.id(),
            start: period.start(),
            end: period.end(),
            state: period.state(),
            approvable_from: period.approvable_from(),
            finalize_after: period.finalize_after(),
            approved: period.approvals().is_approved(),
            corrects: period.corrects(),
            corrected_by: period.corrected_by(),
            case_id: period.case_id().map(str::to_string),
        }
    }
}

/// Response body of `GET /persons/{ident}/periods`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodListResponse {
    /// The person's identity.
    pub ident: String,
    /// Every period ordered by start date, originals before corrections.
    pub periods: Vec<PeriodSummary>,
}

/// API error response structure.
///
/// Returned as JSON when a request fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates an error without details.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates an error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a `VALIDATION_ERROR`.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a `MALFORMED_JSON` error.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// An [`ApiError`] paired with its HTTP status.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The JSON body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<ReportingError> for ApiErrorResponse {
    fn from(error: ReportingError) -> Self {
        let message = error.to_string();
        match error {
            ReportingError::NotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("NOT_FOUND", message),
            },
            ReportingError::GateTooEarly {
                approvable_from, ..
            } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "GATE_TOO_EARLY",
                    message,
                    format!("The period can be approved from {}", approvable_from),
                ),
            },
            ReportingError::IllegalState { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("ILLEGAL_STATE", message),
            },
            ReportingError::Unauthorized { .. } => ApiErrorResponse {
                status: StatusCode::FORBIDDEN,
                error: ApiError::new("UNAUTHORIZED", message),
            },
            ReportingError::ConfigNotFound { .. } | ReportingError::ConfigParseError { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                }
            }
        }
    }
}
