//! `RocksDB` storage layer for the festa attendance ledger.
//!
//! This crate persists participants, venues, and the four ledger record
//! kinds using `RocksDB` with column families for efficient indexing, and
//! implements the transactional visit/award/rating operations.
//!
//! # Architecture
//!
//! - `participants` / `venues`: entity records keyed by ID, with
//!   `*_by_token` indexes for scan-code resolution
//! - `visits` / `ratings`: keyed by `venue_id || participant_id`, so the
//!   one-record-per-pair invariant is structural
//! - `awards`: keyed by ULID, with a time-ordered `awards_by_pair` index
//!   for throttle-window lookups
//! - `violations`: append-only audit records for rejected duplicates
//!
//! Compound operations serialize their check-then-write section under a
//! single writer lock and commit through one `WriteBatch`, so a record and
//! the counter increment that justifies it land or fail together.
//!
//! # Example
//!
//! ```no_run
//! use festa_store::{RocksStore, Store};
//! use festa_core::{Participant, Role, Venue, VisitRecord};
//!
//! let store = RocksStore::open("/tmp/festa-db").unwrap();
//!
//! let participant = Participant::new("mika", Role::Attendee, 2, 3, 14, "p-tok");
//! let venue = Venue::new("Planetarium", "Building B", "v-tok");
//! store.put_participant(&participant).unwrap();
//! store.put_venue(&venue).unwrap();
//!
//! let visit = VisitRecord::new(venue.id, participant.id);
//! let receipt = store.record_visit(&visit).unwrap();
//! assert_eq!(receipt.total_visit_count, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use festa_core::{
    AwardRecord, Participant, ParticipantId, RatingRecord, RatingStats, ReviewPatch, Score, Venue,
    VenueId, VisitReceipt, VisitRecord,
};

/// The storage trait defining all ledger operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Participant Operations
    // =========================================================================

    /// Insert or update a participant record.
    ///
    /// Also maintains the personal-token index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_participant(&self, participant: &Participant) -> Result<()>;

    /// Get a participant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_participant(&self, participant_id: &ParticipantId) -> Result<Option<Participant>>;

    /// Resolve a participant by their personal scan token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_participant_by_token(&self, token: &str) -> Result<Option<Participant>>;

    /// List all participants.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_participants(&self) -> Result<Vec<Participant>>;

    // =========================================================================
    // Venue Operations
    // =========================================================================

    /// Insert a venue record.
    ///
    /// Also maintains the venue-token index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_venue(&self, venue: &Venue) -> Result<()>;

    /// Get a venue by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_venue(&self, venue_id: &VenueId) -> Result<Option<Venue>>;

    /// Resolve a venue by its scan token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_venue_by_token(&self, token: &str) -> Result<Option<Venue>>;

    /// List all venues.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_venues(&self) -> Result<Vec<Venue>>;

    // =========================================================================
    // Visit Operations
    // =========================================================================

    /// Record a visit: check for a prior visit by the pair, insert the
    /// record, and increment the participant's visit counter atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the participant doesn't exist.
    /// - `StoreError::DuplicateVisit` if the pair already has a visit; the
    ///   rejection is also persisted as a violation record.
    fn record_visit(&self, visit: &VisitRecord) -> Result<VisitReceipt>;

    /// Get the visit for a `(venue, participant)` pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_visit(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
    ) -> Result<Option<VisitRecord>>;

    /// Count visits per venue, optionally restricted to visits at or after
    /// a cutoff. `None` counts all-time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn visit_counts_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<HashMap<VenueId, u64>>;

    // =========================================================================
    // Award Operations
    // =========================================================================

    /// Record an award: reject if the pair has an award inside the throttle
    /// window, otherwise insert the record and increment the participant's
    /// points atomically. Returns the new points total.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the participant doesn't exist.
    /// - `StoreError::DuplicateAward` if a prior award falls inside the
    ///   window; the rejection is also persisted as a violation record.
    fn record_award(&self, award: &AwardRecord, window: Duration) -> Result<i64>;

    /// Get the most recent award for a `(venue, participant)` pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn latest_award(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
    ) -> Result<Option<AwardRecord>>;

    // =========================================================================
    // Rating Operations
    // =========================================================================

    /// Create a rating. Requires a prior visit for the pair and no existing
    /// rating.
    ///
    /// # Errors
    ///
    /// - `StoreError::MissingVisitHistory` without a prior visit.
    /// - `StoreError::RatingConflict` if a rating already exists.
    fn create_rating(&self, rating: &RatingRecord) -> Result<()>;

    /// Update an existing rating inside its edit window, measured from the
    /// associated visit's timestamp. Returns the updated record.
    ///
    /// # Errors
    ///
    /// - `StoreError::RatingNotFound` without an existing rating.
    /// - `StoreError::MissingVisitHistory` if the backing visit is missing.
    /// - `StoreError::EditWindowExpired` once
    ///   `now >= visited_at + edit_window`.
    fn update_rating(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
        score: Score,
        review: &ReviewPatch,
        now: DateTime<Utc>,
        edit_window: Duration,
    ) -> Result<RatingRecord>;

    /// Get the rating for a `(venue, participant)` pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_rating(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
    ) -> Result<Option<RatingRecord>>;

    /// Aggregate `(average, count)` per venue.
    ///
    /// An explicit empty filter short-circuits to an empty map without
    /// touching the database; `None` aggregates every venue.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn rating_stats(
        &self,
        venue_ids: Option<&[VenueId]>,
    ) -> Result<HashMap<VenueId, RatingStats>>;

    /// Aggregate one venue's ratings created at or after a cutoff.
    /// Returns `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn rating_stats_since(
        &self,
        venue_id: &VenueId,
        since: DateTime<Utc>,
    ) -> Result<Option<RatingStats>>;
}
