//! Dense-ranked leaderboard computation.
//!
//! `rank` is a pure function over a snapshot of participant standings: no
//! store access, deterministic output regardless of input order.

use serde::{Deserialize, Serialize};

use crate::participant::{profile_label, Participant};
use crate::ParticipantId;

/// One participant's snapshot row fed into the ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standing {
    /// The participant.
    pub participant_id: ParticipantId,

    /// Display nickname (also the tie-break key).
    pub nickname: String,

    /// Grade, used for cohort filtering and display.
    pub grade: u8,

    /// Class number (display only).
    pub class_number: u8,

    /// Student number (display only).
    pub student_number: u8,

    /// Current point total.
    pub points: i64,
}

impl From<&Participant> for Standing {
    fn from(p: &Participant) -> Self {
        Self {
            participant_id: p.id,
            nickname: p.nickname.clone(),
            grade: p.grade,
            class_number: p.class_number,
            student_number: p.student_number,
            points: p.points,
        }
    }
}

/// One ranked leaderboard entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Dense rank: tied point totals share a rank, and the next distinct
    /// total gets exactly the previous rank plus one.
    pub rank: u32,

    /// The participant.
    pub participant_id: ParticipantId,

    /// Display nickname.
    pub nickname: String,

    /// Human-readable grade/class/number label.
    pub profile_label: String,

    /// Grade of the participant.
    pub grade: u8,

    /// Point total at snapshot time.
    pub points: i64,
}

/// Rank a snapshot of standings.
///
/// The grade filter narrows the input set *before* ranking, so point totals
/// outside the cohort never influence the cohort's ranks. Sort order is
/// points descending with ties broken by case-folded nickname ascending;
/// ranks are dense (`[150, 150, 120]` ranks as `[1, 1, 2]`).
#[must_use]
pub fn rank(rows: Vec<Standing>, grade_filter: Option<u8>) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<Standing> = match grade_filter {
        Some(grade) => rows.into_iter().filter(|r| r.grade == grade).collect(),
        None => rows,
    };

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| fold_name(&a.nickname).cmp(&fold_name(&b.nickname)))
            .then_with(|| a.nickname.cmp(&b.nickname))
    });

    let mut entries = Vec::with_capacity(rows.len());
    let mut current_rank = 0u32;
    let mut previous_points: Option<i64> = None;

    for row in rows {
        if previous_points != Some(row.points) {
            current_rank += 1;
            previous_points = Some(row.points);
        }
        entries.push(LeaderboardEntry {
            rank: current_rank,
            participant_id: row.participant_id,
            profile_label: profile_label(row.grade, row.class_number, row.student_number),
            nickname: row.nickname,
            grade: row.grade,
            points: row.points,
        });
    }

    entries
}

/// Case-insensitive comparison key for names.
///
/// Unicode lowercase folding; full locale collation is intentionally not
/// pulled in, so diacritics compare by their folded codepoints.
pub(crate) fn fold_name(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).collect()
}
