//! Recency-weighted trending computation.
//!
//! `score_venues` is a pure function over pre-fetched per-venue activity
//! rows: visits are the primary signal, and a smoothed rating figure perturbs
//! the ordering by at most the configured rating weight.

use serde::{Deserialize, Serialize};

use crate::config::FestivalConfig;
use crate::leaderboard::fold_name;
use crate::ledger::RatingStats;
use crate::VenueId;

/// The neutral rating assumed for venues with no ratings anywhere.
pub const NEUTRAL_PRIOR: f64 = 3.0;

/// Tuning weights for the trending score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrendingParams {
    /// Maximum proportional perturbation the rating signal applies.
    pub rating_weight: f64,

    /// Pseudo-rating count the all-time average contributes when smoothing
    /// a small recent sample.
    pub smoothing_weight: f64,
}

impl From<&FestivalConfig> for TrendingParams {
    fn from(config: &FestivalConfig) -> Self {
        Self {
            rating_weight: config.rating_weight,
            smoothing_weight: config.smoothing_weight,
        }
    }
}

/// Pre-fetched activity snapshot for one venue.
///
/// `window_visits` is the count inside the active window. When the caller
/// has fallen back to all-time history, it equals `total_visits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueActivity {
    /// The venue.
    pub venue_id: VenueId,

    /// Display name (also the final tie-break key).
    pub name: String,

    /// Visit count inside the active window.
    pub window_visits: u64,

    /// All-time visit count.
    pub total_visits: u64,

    /// Rating aggregate restricted to the window, if any.
    pub recent_rating: Option<RatingStats>,

    /// All-time rating aggregate, used as the smoothing prior.
    pub alltime_rating: Option<RatingStats>,
}

/// Which pool a displayed rating figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingScope {
    /// Smoothed from ratings inside the window.
    Recent,

    /// Taken from the all-time pool (no recent ratings).
    AllTime,

    /// No ratings exist anywhere; the neutral prior was used.
    Unrated,
}

/// Which visit pool the whole trending result was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendingSource {
    /// Visit counts from the recency window.
    Recent,

    /// No activity in the window; all-time counts were used instead.
    History,
}

/// One trending entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingEntry {
    /// 1-based position. A strict ordering index: unlike the leaderboard,
    /// trending ranks are never shared.
    pub rank: u32,

    /// The venue.
    pub venue_id: VenueId,

    /// Display name.
    pub name: String,

    /// The computed trending score.
    pub score: f64,

    /// Visit count inside the active window.
    pub window_visits: u64,

    /// All-time visit count.
    pub total_visits: u64,

    /// The smoothed rating figure that entered the score.
    pub rating: f64,

    /// Which pool `rating` came from, so callers can label it honestly.
    pub rating_scope: RatingScope,
}

/// Score, order, and truncate venue activity rows.
///
/// Venues with zero visits in the active window are not candidates. Sort is
/// score descending, then window visits, then all-time visits, then
/// case-folded name ascending; the result is truncated to `limit` with
/// 1-based sequential ranks.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn score_venues(
    rows: Vec<VenueActivity>,
    params: &TrendingParams,
    limit: usize,
) -> Vec<TrendingEntry> {
    let mut scored: Vec<(f64, f64, RatingScope, VenueActivity)> = rows
        .into_iter()
        .filter(|row| row.window_visits > 0)
        .map(|row| {
            let (rating, scope) = smoothed_rating(&row, params.smoothing_weight);
            let normalized = ((rating - NEUTRAL_PRIOR) / 2.0).clamp(-1.0, 1.0);
            let score = row.window_visits as f64 * (1.0 + params.rating_weight * normalized);
            (score, rating, scope, row)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| b.3.window_visits.cmp(&a.3.window_visits))
            .then_with(|| b.3.total_visits.cmp(&a.3.total_visits))
            .then_with(|| fold_name(&a.3.name).cmp(&fold_name(&b.3.name)))
    });

    scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, (score, rating, rating_scope, row))| TrendingEntry {
            rank: index as u32 + 1,
            venue_id: row.venue_id,
            name: row.name,
            score,
            window_visits: row.window_visits,
            total_visits: row.total_visits,
            rating,
            rating_scope,
        })
        .collect()
}

/// Compute the rating figure for one venue.
///
/// With recent ratings, the recent average is damped toward the all-time
/// average, which counts as `smoothing_weight` pseudo-ratings. Without
/// recent ratings the all-time average is used directly; without any
/// ratings, the neutral prior.
#[allow(clippy::cast_precision_loss)]
fn smoothed_rating(row: &VenueActivity, smoothing_weight: f64) -> (f64, RatingScope) {
    match row.recent_rating {
        Some(recent) if recent.count > 0 => {
            let global = row
                .alltime_rating
                .map_or(NEUTRAL_PRIOR, |stats| stats.average);
            let n = recent.count as f64;
            let smoothed =
                (recent.average * n + global * smoothing_weight) / (n + smoothing_weight);
            (smoothed, RatingScope::Recent)
        }
        _ => match row.alltime_rating {
            Some(stats) if stats.count > 0 => (stats.average, RatingScope::AllTime),
            _ => (NEUTRAL_PRIOR, RatingScope::Unrated),
        },
    }
}
