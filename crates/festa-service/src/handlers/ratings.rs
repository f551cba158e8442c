//! Rating creation, update, and aggregate handlers.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use festa_core::{ParticipantId, RatingRecord, ReviewPatch, Score, VenueId};
use festa_store::Store;

use crate::auth::StationAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Rating creation request.
#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    /// The rating participant.
    pub participant_id: ParticipantId,
    /// Raw score; rounded and range-checked to `[1, 5]`.
    pub score: f64,
    /// Optional free-text review.
    pub review: Option<String>,
}

/// Rating update request.
///
/// `review` is tri-state: omitted leaves the stored review untouched,
/// explicit `null` clears it, a string replaces it (trimmed).
#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    /// The rating participant.
    pub participant_id: ParticipantId,
    /// Raw score; rounded and range-checked to `[1, 5]`.
    pub score: f64,
    /// Tri-state review change.
    #[serde(default, deserialize_with = "double_option")]
    pub review: Option<Option<String>>,
}

/// Deserialize a field so that "absent" and "null" stay distinguishable.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Rating response.
#[derive(Debug, Serialize)]
pub struct RatingResponse {
    /// The rated venue.
    pub venue_id: String,
    /// The rating participant.
    pub participant_id: String,
    /// Stored integer score.
    pub score: u8,
    /// Stored review, if any.
    pub review: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<&RatingRecord> for RatingResponse {
    fn from(r: &RatingRecord) -> Self {
        Self {
            venue_id: r.venue_id.to_string(),
            participant_id: r.participant_id.to_string(),
            score: r.score,
            review: r.review.clone(),
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// Create a rating for a visited venue.
pub async fn create_rating(
    State(state): State<Arc<AppState>>,
    auth: StationAuth,
    Path(venue_id): Path<VenueId>,
    Json(body): Json<CreateRatingRequest>,
) -> Result<(StatusCode, Json<RatingResponse>), ApiError> {
    let score = Score::try_from_f64(body.score)?;

    let rating = RatingRecord::new(venue_id, body.participant_id, score, body.review);
    state.store.create_rating(&rating)?;

    tracing::info!(
        venue_id = %venue_id,
        participant_id = %body.participant_id,
        score = %rating.score,
        station = %auth.station_name,
        "Rating created"
    );

    Ok((StatusCode::CREATED, Json(RatingResponse::from(&rating))))
}

/// Update an existing rating inside its edit window.
pub async fn update_rating(
    State(state): State<Arc<AppState>>,
    auth: StationAuth,
    Path(venue_id): Path<VenueId>,
    Json(body): Json<UpdateRatingRequest>,
) -> Result<Json<RatingResponse>, ApiError> {
    let score = Score::try_from_f64(body.score)?;

    let patch = match body.review {
        None => ReviewPatch::Keep,
        Some(None) => ReviewPatch::Clear,
        Some(Some(text)) => ReviewPatch::Set(text),
    };

    let rating = state.store.update_rating(
        &venue_id,
        &body.participant_id,
        score,
        &patch,
        Utc::now(),
        state.config.festival.rating_edit_window(),
    )?;

    tracing::info!(
        venue_id = %venue_id,
        participant_id = %body.participant_id,
        score = %rating.score,
        station = %auth.station_name,
        "Rating updated"
    );

    Ok(Json(RatingResponse::from(&rating)))
}

/// Rating stats query parameters.
#[derive(Debug, Deserialize)]
pub struct RatingStatsQuery {
    /// Comma-separated venue IDs. Absent aggregates every venue; present
    /// but empty returns an empty result without querying.
    pub venue_ids: Option<String>,
}

/// Per-venue aggregate figures.
#[derive(Debug, Serialize)]
pub struct RatingStatsEntry {
    /// Mean score.
    pub average: f64,
    /// Number of ratings aggregated.
    pub count: u64,
}

/// Rating stats response, keyed by venue ID.
#[derive(Debug, Serialize)]
pub struct RatingStatsResponse {
    /// Aggregates per venue.
    pub stats: HashMap<String, RatingStatsEntry>,
}

/// Aggregate `(average, count)` per venue.
pub async fn rating_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RatingStatsQuery>,
) -> Result<Json<RatingStatsResponse>, ApiError> {
    let filter: Option<Vec<VenueId>> = match query.venue_ids.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| {
                    VenueId::from_str(t)
                        .map_err(|_| ApiError::BadRequest(format!("invalid venue id: {t}")))
                })
                .collect::<Result<_, _>>()?,
        ),
    };

    let stats = state.store.rating_stats(filter.as_deref())?;

    Ok(Json(RatingStatsResponse {
        stats: stats
            .into_iter()
            .map(|(venue_id, s)| {
                (
                    venue_id.to_string(),
                    RatingStatsEntry {
                        average: s.average,
                        count: s.count,
                    },
                )
            })
            .collect(),
    }))
}
