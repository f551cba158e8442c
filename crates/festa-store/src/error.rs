//! Error types for festa storage.

use chrono::{DateTime, Utc};
use festa_core::{ParticipantId, VenueId};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// Duplicate/conflict variants are expected business outcomes, not system
/// faults; they carry the timestamps the caller needs for user messaging,
/// and each one is also persisted as a `ViolationRecord` before it returns.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// The participant already visited this venue. Permanent; never
    /// becomes eligible again.
    #[error("already visited at {last_visited_at}")]
    DuplicateVisit {
        /// When the original visit happened.
        last_visited_at: DateTime<Utc>,
    },

    /// The participant received an award at this venue inside the throttle
    /// window. Retryable after `available_at`.
    #[error("award throttled until {available_at}")]
    DuplicateAward {
        /// When a retry becomes eligible.
        available_at: DateTime<Utc>,
    },

    /// A rating requires a prior visit.
    #[error("no visit on record for venue {venue_id} by participant {participant_id}")]
    MissingVisitHistory {
        /// The rated venue.
        venue_id: VenueId,
        /// The rating participant.
        participant_id: ParticipantId,
    },

    /// A rating already exists for this pair; use update instead.
    #[error("rating already exists for venue {venue_id} by participant {participant_id}")]
    RatingConflict {
        /// The rated venue.
        venue_id: VenueId,
        /// The rating participant.
        participant_id: ParticipantId,
    },

    /// No rating exists for this pair; create one first.
    #[error("no rating for venue {venue_id} by participant {participant_id}")]
    RatingNotFound {
        /// The rated venue.
        venue_id: VenueId,
        /// The rating participant.
        participant_id: ParticipantId,
    },

    /// The rating edit window has lapsed.
    #[error("rating edit window expired at {expired_at}")]
    EditWindowExpired {
        /// When the window closed.
        expired_at: DateTime<Utc>,
    },
}
