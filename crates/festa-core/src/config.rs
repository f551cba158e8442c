//! Engine tuning configuration for festa.
//!
//! The core consumes these values but does not own their tuning: award value,
//! throttle and edit windows, and the trending weights are product decisions
//! supplied by the surrounding application.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Configuration for the recorders and ranking engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FestivalConfig {
    /// Points granted per award. Fixed; never caller-supplied.
    pub award_points: i64,

    /// Rolling window during which a repeat award for the same
    /// `(venue, participant)` pair is rejected.
    pub throttle_window_minutes: i64,

    /// How long after a visit its rating may still be edited.
    pub rating_edit_window_ms: i64,

    /// Recency window for trending visit counts.
    pub trending_window_minutes: i64,

    /// Maximum number of trending entries returned.
    pub trending_limit: usize,

    /// How strongly the rating signal perturbs the trending ordering.
    /// A venue's score moves by at most this fraction of its visit count.
    pub rating_weight: f64,

    /// Bayesian smoothing weight: the all-time average counts as this many
    /// pseudo-ratings when damping a small recent sample.
    pub smoothing_weight: f64,
}

impl Default for FestivalConfig {
    fn default() -> Self {
        Self {
            award_points: 10,
            throttle_window_minutes: 30,
            rating_edit_window_ms: 24 * 60 * 60 * 1000,
            trending_window_minutes: 30,
            trending_limit: 10,
            rating_weight: 0.2,
            smoothing_weight: 5.0,
        }
    }
}

impl FestivalConfig {
    /// The award throttle window as a duration.
    #[must_use]
    pub fn throttle_window(&self) -> Duration {
        Duration::minutes(self.throttle_window_minutes)
    }

    /// The rating edit window as a duration.
    #[must_use]
    pub fn rating_edit_window(&self) -> Duration {
        Duration::milliseconds(self.rating_edit_window_ms)
    }

    /// The trending recency window as a duration.
    #[must_use]
    pub fn trending_window(&self) -> Duration {
        Duration::minutes(self.trending_window_minutes)
    }
}
