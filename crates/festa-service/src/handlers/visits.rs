//! Visit recording handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use festa_core::{ParticipantId, RatingStatus, VisitRecord};
use festa_store::Store;

use crate::auth::StationAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Visit scan request from a station.
#[derive(Debug, Deserialize)]
pub struct RecordVisitRequest {
    /// The scanning participant.
    pub participant_id: ParticipantId,
    /// The venue's scan token.
    pub venue_token: String,
}

/// Rating prompt state returned with the visit.
#[derive(Debug, Serialize)]
pub struct RatingStatusResponse {
    /// The visited venue.
    pub venue_id: String,
    /// Whether the participant already rated this venue.
    pub has_rated: bool,
    /// The stored score, if any.
    pub score: Option<u8>,
}

impl From<&RatingStatus> for RatingStatusResponse {
    fn from(status: &RatingStatus) -> Self {
        Self {
            venue_id: status.venue_id.to_string(),
            has_rated: status.has_rated,
            score: status.score,
        }
    }
}

/// Visit response.
#[derive(Debug, Serialize)]
pub struct VisitResponse {
    /// The visited venue.
    pub venue_id: String,
    /// The venue's display name.
    pub venue_name: String,
    /// The visiting participant.
    pub participant_id: String,
    /// When the visit was recorded.
    pub visited_at: String,
    /// The participant's visit counter after the increment.
    pub total_visit_count: i64,
    /// Rating prompt state for the venue.
    pub rating_status: RatingStatusResponse,
}

/// Record a visit scan.
///
/// A repeat scan for the same pair is rejected with `409 duplicate_visit`
/// carrying the original visit time; the rejection is audited server-side.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    auth: StationAuth,
    Json(body): Json<RecordVisitRequest>,
) -> Result<Json<VisitResponse>, ApiError> {
    let venue = state
        .store
        .find_venue_by_token(&body.venue_token)?
        .ok_or_else(|| {
            ApiError::NotFound(format!("venue not found for token: {}", body.venue_token))
        })?;

    let visit = VisitRecord::new(venue.id, body.participant_id);
    let receipt = state.store.record_visit(&visit)?;

    tracing::info!(
        venue_id = %venue.id,
        participant_id = %body.participant_id,
        total_visit_count = %receipt.total_visit_count,
        station = %auth.station_name,
        "Visit recorded"
    );

    Ok(Json(VisitResponse {
        venue_id: venue.id.to_string(),
        venue_name: venue.name,
        participant_id: body.participant_id.to_string(),
        visited_at: receipt.visit.visited_at.to_rfc3339(),
        total_visit_count: receipt.total_visit_count,
        rating_status: RatingStatusResponse::from(&receipt.rating),
    }))
}
