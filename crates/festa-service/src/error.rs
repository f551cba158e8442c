//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// API error type.
///
/// Conflict variants carry the timestamp the UI needs to explain *why* the
/// attempt was rejected ("already visited at 10:42"). None of them are
/// system faults, and none are retried by the service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid station key.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The participant already visited this venue.
    #[error("already visited at {last_visited_at}")]
    DuplicateVisit {
        /// When the original visit happened.
        last_visited_at: DateTime<Utc>,
    },

    /// The participant was already awarded at this venue inside the window.
    #[error("award throttled until {available_at}")]
    DuplicateAward {
        /// When a retry becomes eligible.
        available_at: DateTime<Utc>,
    },

    /// A rating already exists for this pair; use update instead.
    #[error("rating conflict: {0}")]
    RatingConflict(String),

    /// The rating edit window has lapsed.
    #[error("rating edit window expired at {expired_at}")]
    EditWindowExpired {
        /// When the window closed.
        expired_at: DateTime<Utc>,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::DuplicateVisit { last_visited_at } => (
                StatusCode::CONFLICT,
                "duplicate_visit",
                self.to_string(),
                Some(serde_json::json!({
                    "last_visited_at": last_visited_at.to_rfc3339()
                })),
            ),
            Self::DuplicateAward { available_at } => (
                StatusCode::CONFLICT,
                "duplicate_award",
                self.to_string(),
                Some(serde_json::json!({
                    "available_at": available_at.to_rfc3339()
                })),
            ),
            Self::RatingConflict(msg) => {
                (StatusCode::CONFLICT, "rating_conflict", msg.clone(), None)
            }
            Self::EditWindowExpired { expired_at } => (
                StatusCode::CONFLICT,
                "edit_window_expired",
                self.to_string(),
                Some(serde_json::json!({
                    "expired_at": expired_at.to_rfc3339()
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<festa_store::StoreError> for ApiError {
    fn from(err: festa_store::StoreError) -> Self {
        use festa_store::StoreError;

        match err {
            StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            StoreError::DuplicateVisit { last_visited_at } => {
                Self::DuplicateVisit { last_visited_at }
            }
            StoreError::DuplicateAward { available_at } => Self::DuplicateAward { available_at },
            StoreError::MissingVisitHistory {
                venue_id,
                participant_id,
            } => Self::NotFound(format!(
                "no visit on record for venue {venue_id} by participant {participant_id}"
            )),
            StoreError::RatingConflict {
                venue_id,
                participant_id,
            } => Self::RatingConflict(format!(
                "rating already exists for venue {venue_id} by participant {participant_id}"
            )),
            StoreError::RatingNotFound {
                venue_id,
                participant_id,
            } => Self::NotFound(format!(
                "no rating for venue {venue_id} by participant {participant_id}"
            )),
            StoreError::EditWindowExpired { expired_at } => {
                Self::EditWindowExpired { expired_at }
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<festa_core::ScoreError> for ApiError {
    fn from(err: festa_core::ScoreError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
