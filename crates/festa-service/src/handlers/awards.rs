//! Point award handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use festa_core::{AwardRecord, VenueId};
use festa_store::Store;

use crate::auth::StationAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Award scan request: the station scans a participant's personal code.
#[derive(Debug, Deserialize)]
pub struct AwardPointsRequest {
    /// The awarding venue.
    pub venue_id: VenueId,
    /// The participant's personal scan code (not the venue token).
    pub qr_token: String,
}

/// Award response.
#[derive(Debug, Serialize)]
pub struct AwardResponse {
    /// Award ID.
    pub award_id: String,
    /// The awarding venue.
    pub venue_id: String,
    /// The awarded participant.
    pub participant_id: String,
    /// Points granted by this award.
    pub points: i64,
    /// When the award was granted.
    pub awarded_at: String,
    /// The participant's points total after the increment.
    pub total_points: i64,
}

/// Grant the configured award points to a participant.
///
/// The points value is fixed by configuration; repeat attempts inside the
/// throttle window are rejected with `409 duplicate_award` carrying the
/// retry-eligible time.
pub async fn award_points(
    State(state): State<Arc<AppState>>,
    auth: StationAuth,
    Json(body): Json<AwardPointsRequest>,
) -> Result<Json<AwardResponse>, ApiError> {
    let venue = state
        .store
        .get_venue(&body.venue_id)?
        .ok_or_else(|| ApiError::NotFound(format!("venue not found: {}", body.venue_id)))?;

    // The personal token must resolve to an attendee; staff and admin codes
    // do not earn points.
    let participant = state
        .store
        .find_participant_by_token(&body.qr_token)?
        .filter(festa_core::Participant::is_attendee)
        .ok_or_else(|| {
            ApiError::NotFound(format!("participant not found for token: {}", body.qr_token))
        })?;

    let award = AwardRecord::new(venue.id, participant.id, state.config.festival.award_points);
    let total_points = state
        .store
        .record_award(&award, state.config.festival.throttle_window())?;

    tracing::info!(
        venue_id = %venue.id,
        participant_id = %participant.id,
        points = %award.points,
        total_points = %total_points,
        station = %auth.station_name,
        "Points awarded"
    );

    Ok(Json(AwardResponse {
        award_id: award.id.to_string(),
        venue_id: venue.id.to_string(),
        participant_id: participant.id.to_string(),
        points: award.points,
        awarded_at: award.awarded_at.to_rfc3339(),
        total_points,
    }))
}
