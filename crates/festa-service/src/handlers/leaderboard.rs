//! Leaderboard handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use festa_core::leaderboard::{self, LeaderboardEntry, Standing};
use festa_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Leaderboard query parameters.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Restrict the board to one grade cohort.
    pub grade: Option<u8>,
}

/// One leaderboard entry.
#[derive(Debug, Serialize)]
pub struct LeaderboardEntryResponse {
    /// Dense rank.
    pub rank: u32,
    /// Participant ID.
    pub participant_id: String,
    /// Display nickname.
    pub nickname: String,
    /// Human-readable grade/class/number label.
    pub profile_label: String,
    /// Grade.
    pub grade: u8,
    /// Point total at snapshot time.
    pub points: i64,
}

impl From<LeaderboardEntry> for LeaderboardEntryResponse {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            participant_id: e.participant_id.to_string(),
            nickname: e.nickname,
            profile_label: e.profile_label,
            grade: e.grade,
            points: e.points,
        }
    }
}

/// Leaderboard response.
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    /// When the snapshot was taken.
    pub generated_at: String,
    /// Number of ranked participants.
    pub total_participants: usize,
    /// Ranked entries, best first.
    pub entries: Vec<LeaderboardEntryResponse>,
}

/// Compute the leaderboard from the current ledger state.
///
/// Read-only; every poll ranks a fresh snapshot.
pub async fn compute_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let rows: Vec<Standing> = state
        .store
        .list_participants()?
        .iter()
        .filter(|p| p.is_attendee())
        .map(Standing::from)
        .collect();

    let entries = leaderboard::rank(rows, query.grade);

    Ok(Json(LeaderboardResponse {
        generated_at: Utc::now().to_rfc3339(),
        total_participants: entries.len(),
        entries: entries
            .into_iter()
            .map(LeaderboardEntryResponse::from)
            .collect(),
    }))
}
