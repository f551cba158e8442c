//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Participant records, keyed by `participant_id`.
    pub const PARTICIPANTS: &str = "participants";

    /// Index: participant by personal scan token, keyed by `qr_token`.
    /// Value is the participant ID bytes.
    pub const PARTICIPANTS_BY_TOKEN: &str = "participants_by_token";

    /// Venue records, keyed by `venue_id`.
    pub const VENUES: &str = "venues";

    /// Index: venue by scan token, keyed by `qr_token`.
    /// Value is the venue ID bytes.
    pub const VENUES_BY_TOKEN: &str = "venues_by_token";

    /// Visit records, keyed by `venue_id || participant_id`.
    ///
    /// The pair key is the at-most-one-visit-per-pair constraint: a second
    /// record for the same pair has nowhere to go.
    pub const VISITS: &str = "visits";

    /// Award records, keyed by `award_id` (ULID).
    pub const AWARDS: &str = "awards";

    /// Index: awards by pair, keyed by
    /// `venue_id || participant_id || award_id`. Value is empty (index only);
    /// the ULID suffix sorts awards for a pair chronologically.
    pub const AWARDS_BY_PAIR: &str = "awards_by_pair";

    /// Rating records, keyed by `venue_id || participant_id`.
    /// The pair key enforces at most one rating per pair.
    pub const RATINGS: &str = "ratings";

    /// Violation audit records, keyed by `violation_id` (ULID). Append-only.
    pub const VIOLATIONS: &str = "violations";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::PARTICIPANTS,
        cf::PARTICIPANTS_BY_TOKEN,
        cf::VENUES,
        cf::VENUES_BY_TOKEN,
        cf::VISITS,
        cf::AWARDS,
        cf::AWARDS_BY_PAIR,
        cf::RATINGS,
        cf::VIOLATIONS,
    ]
}
