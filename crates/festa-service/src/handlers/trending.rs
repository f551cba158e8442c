//! Trending venue handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use festa_core::trending::{
    self, TrendingEntry, TrendingParams, TrendingSource, VenueActivity,
};
use festa_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Trending query parameters.
#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    /// Recency window in minutes (default from configuration).
    pub window_minutes: Option<i64>,
    /// Maximum entries returned (default from configuration).
    pub limit: Option<usize>,
}

/// Trending response.
#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    /// When the snapshot was taken.
    pub generated_at: String,
    /// The window the counts were taken over.
    pub window_minutes: i64,
    /// Whether the counts came from the window or from all-time history.
    pub source: TrendingSource,
    /// Ranked entries, hottest first.
    pub entries: Vec<TrendingEntry>,
}

/// Compute the trending venue list from the current ledger state.
///
/// Read-only and pull-based: counts are aggregated fresh per call, and when
/// the window holds no activity at all the computation falls back to
/// all-time history so a lull never empties the view. The handful of scans
/// this issues are not snapshot-isolated against each other; a few
/// milliseconds of skew between them is tolerated.
pub async fn compute_trending(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<TrendingResponse>, ApiError> {
    let window_minutes = query
        .window_minutes
        .unwrap_or(state.config.festival.trending_window_minutes);
    let limit = query.limit.unwrap_or(state.config.festival.trending_limit);

    let now = Utc::now();
    let window_start = now - Duration::minutes(window_minutes);

    let mut counts = state.store.visit_counts_since(Some(window_start))?;
    let source = if counts.is_empty() {
        counts = state.store.visit_counts_since(None)?;
        TrendingSource::History
    } else {
        TrendingSource::Recent
    };

    let total_counts = state.store.visit_counts_since(None)?;

    let mut rows = Vec::with_capacity(counts.len());
    for (venue_id, window_visits) in counts {
        let Some(venue) = state.store.get_venue(&venue_id)? else {
            continue;
        };

        let recent_rating = state.store.rating_stats_since(&venue_id, window_start)?;
        let alltime_rating = state
            .store
            .rating_stats(Some(&[venue_id]))?
            .remove(&venue_id);

        rows.push(VenueActivity {
            venue_id,
            name: venue.name,
            window_visits,
            total_visits: total_counts.get(&venue_id).copied().unwrap_or(window_visits),
            recent_rating,
            alltime_rating,
        });
    }

    let params = TrendingParams::from(&state.config.festival);
    let entries = trending::score_venues(rows, &params, limit);

    Ok(Json(TrendingResponse {
        generated_at: now.to_rfc3339(),
        window_minutes,
        source,
        entries,
    }))
}
