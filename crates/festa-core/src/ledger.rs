//! Ledger record types for festa.
//!
//! This module defines the four ledger entities: visits, awards, ratings, and
//! violation audit entries. All four are created exactly once and never
//! mutated afterwards, except a rating's score/review inside its edit window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ParticipantId, RecordId, VenueId};

/// A recorded visit.
///
/// At most one visit may exist per `(venue, participant)` pair, ever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    /// The visited venue.
    pub venue_id: VenueId,

    /// The visiting participant.
    pub participant_id: ParticipantId,

    /// When the visit was scanned.
    pub visited_at: DateTime<Utc>,
}

impl VisitRecord {
    /// Create a new visit record stamped with the current time.
    #[must_use]
    pub fn new(venue_id: VenueId, participant_id: ParticipantId) -> Self {
        Self {
            venue_id,
            participant_id,
            visited_at: Utc::now(),
        }
    }
}

/// A point award.
///
/// Awards for the same `(venue, participant)` pair must be at least one
/// throttle window apart. Rolling, not permanent, uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardRecord {
    /// Unique award ID (ULID for time-ordering).
    pub id: RecordId,

    /// The awarding venue.
    pub venue_id: VenueId,

    /// The awarded participant.
    pub participant_id: ParticipantId,

    /// Points granted. Fixed by configuration, not caller-supplied.
    pub points: i64,

    /// When the award was granted.
    pub awarded_at: DateTime<Utc>,
}

impl AwardRecord {
    /// Create a new award record stamped with the current time.
    #[must_use]
    pub fn new(venue_id: VenueId, participant_id: ParticipantId, points: i64) -> Self {
        Self {
            id: RecordId::generate(),
            venue_id,
            participant_id,
            points,
            awarded_at: Utc::now(),
        }
    }
}

/// A 1-5 rating with an optional free-text review.
///
/// At most one per `(venue, participant)` pair, and only after a visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRecord {
    /// The rated venue.
    pub venue_id: VenueId,

    /// The rating participant.
    pub participant_id: ParticipantId,

    /// Integer score in `[1, 5]`.
    pub score: u8,

    /// Optional free-text review.
    pub review: Option<String>,

    /// When the rating was created.
    pub created_at: DateTime<Utc>,

    /// When the rating was last updated.
    pub updated_at: DateTime<Utc>,
}

impl RatingRecord {
    /// Create a new rating record stamped with the current time.
    #[must_use]
    pub fn new(
        venue_id: VenueId,
        participant_id: ParticipantId,
        score: Score,
        review: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            venue_id,
            participant_id,
            score: score.get(),
            review: ReviewPatch::from_submission(review).apply(None),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A validated rating score.
///
/// Raw submissions are rounded to the nearest integer and range-checked to
/// `[1, 5]` before a `Score` exists at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

/// The accepted score range.
pub const SCORE_MIN: u8 = 1;
/// The accepted score range.
pub const SCORE_MAX: u8 = 5;

impl Score {
    /// Round and range-check a raw submitted score.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` if the rounded value falls outside
    /// `[1, 5]`, or `ScoreError::NotFinite` for NaN/infinite input.
    pub fn try_from_f64(raw: f64) -> Result<Self, ScoreError> {
        if !raw.is_finite() {
            return Err(ScoreError::NotFinite);
        }
        let rounded = raw.round();
        if rounded < f64::from(SCORE_MIN) || rounded > f64::from(SCORE_MAX) {
            return Err(ScoreError::OutOfRange { value: raw });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self(rounded as u8))
    }

    /// Return the validated integer score.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Errors from score validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// The rounded score falls outside `[1, 5]`.
    #[error("score out of range: {value} (accepted: 1-5)")]
    OutOfRange {
        /// The raw submitted value.
        value: f64,
    },

    /// The submitted score is NaN or infinite.
    #[error("score is not a finite number")]
    NotFinite,
}

/// Tri-state review change for rating updates.
///
/// The wire format distinguishes "field omitted" (keep the stored review)
/// from "field null" (clear it) from "field present" (replace it, trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewPatch {
    /// Leave the stored review untouched.
    Keep,

    /// Clear the stored review.
    Clear,

    /// Replace the stored review with the trimmed text.
    Set(String),
}

impl ReviewPatch {
    /// Build a patch from an already-decoded optional submission, as used on
    /// rating creation where "omitted" and "null" both mean no review.
    #[must_use]
    pub fn from_submission(review: Option<String>) -> Self {
        review.map_or(Self::Clear, Self::Set)
    }

    /// Apply the patch to the currently stored review.
    ///
    /// A replacement that trims to the empty string clears the review rather
    /// than storing an empty one.
    #[must_use]
    pub fn apply(&self, current: Option<String>) -> Option<String> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

/// Aggregate rating figures for one venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingStats {
    /// Mean score.
    pub average: f64,

    /// Number of ratings aggregated.
    pub count: u64,
}

/// Per-venue rating state returned to the caller after a visit, so the UI
/// knows whether to prompt for a rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingStatus {
    /// The venue the status describes.
    pub venue_id: VenueId,

    /// Whether the participant has already rated this venue.
    pub has_rated: bool,

    /// The stored score, if any.
    pub score: Option<u8>,
}

/// Result of a successful visit recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitReceipt {
    /// The stored visit.
    pub visit: VisitRecord,

    /// The participant's visit counter after the increment.
    pub total_visit_count: i64,

    /// Rating state for the visited venue.
    pub rating: RatingStatus,
}

/// An append-only audit entry for a rejected duplicate attempt.
///
/// Violations are written by the recorders and never read back by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Unique violation ID (ULID for time-ordering).
    pub id: RecordId,

    /// What kind of duplicate was rejected.
    pub kind: ViolationKind,

    /// The venue of the rejected attempt.
    pub venue_id: VenueId,

    /// The participant of the rejected attempt.
    pub participant_id: ParticipantId,

    /// When the duplicate was detected.
    pub detected_at: DateTime<Utc>,

    /// Timestamp of the prior record that caused the rejection.
    pub last_occurred_at: DateTime<Utc>,

    /// When a retry becomes eligible. For permanent duplicates this equals
    /// `last_occurred_at`: there is no "eligible again" time.
    pub available_at: DateTime<Utc>,
}

impl ViolationRecord {
    /// Create an audit entry for a rejected repeat visit.
    #[must_use]
    pub fn duplicate_visit(
        venue_id: VenueId,
        participant_id: ParticipantId,
        last_visited_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            kind: ViolationKind::DuplicateVisit,
            venue_id,
            participant_id,
            detected_at: Utc::now(),
            last_occurred_at: last_visited_at,
            available_at: last_visited_at,
        }
    }

    /// Create an audit entry for an award attempt inside the throttle window.
    #[must_use]
    pub fn duplicate_award(
        venue_id: VenueId,
        participant_id: ParticipantId,
        last_awarded_at: DateTime<Utc>,
        available_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            kind: ViolationKind::DuplicateAward,
            venue_id,
            participant_id,
            detected_at: Utc::now(),
            last_occurred_at: last_awarded_at,
            available_at,
        }
    }
}

/// Kind of rejected duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A repeat visit. Permanent: never becomes eligible again.
    DuplicateVisit,

    /// An award attempt inside the throttle window. Retryable later.
    DuplicateAward,
}

impl ViolationKind {
    /// Check whether the rejected attempt becomes eligible again.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::DuplicateAward)
    }
}
