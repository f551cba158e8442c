//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families.

use festa_core::{ParticipantId, RecordId, VenueId};

/// Create a participant key from a participant ID.
#[must_use]
pub fn participant_key(participant_id: &ParticipantId) -> Vec<u8> {
    participant_id.as_bytes().to_vec()
}

/// Create a venue key from a venue ID.
#[must_use]
pub fn venue_key(venue_id: &VenueId) -> Vec<u8> {
    venue_id.as_bytes().to_vec()
}

/// Create a token-index key from a scan token.
#[must_use]
pub fn token_key(token: &str) -> Vec<u8> {
    token.as_bytes().to_vec()
}

/// Create a pair key for visits and ratings.
///
/// Format: `venue_id (16 bytes) || participant_id (16 bytes)`
///
/// Keying on the pair makes the one-record-per-pair invariant structural.
#[must_use]
pub fn pair_key(venue_id: &VenueId, participant_id: &ParticipantId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(venue_id.as_bytes());
    key.extend_from_slice(participant_id.as_bytes());
    key
}

/// Create a prefix for iterating all pair-keyed records of a venue.
#[must_use]
pub fn venue_prefix(venue_id: &VenueId) -> Vec<u8> {
    venue_id.as_bytes().to_vec()
}

/// Create an award key from an award ID.
#[must_use]
pub fn award_key(award_id: &RecordId) -> Vec<u8> {
    award_id.to_bytes().to_vec()
}

/// Create an award pair-index key.
///
/// Format: `venue_id (16) || participant_id (16) || award_id (16)`
///
/// Since ULIDs are time-ordered, awards for a pair sort chronologically.
#[must_use]
pub fn award_pair_key(
    venue_id: &VenueId,
    participant_id: &ParticipantId,
    award_id: &RecordId,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(48);
    key.extend_from_slice(venue_id.as_bytes());
    key.extend_from_slice(participant_id.as_bytes());
    key.extend_from_slice(&award_id.to_bytes());
    key
}

/// Create a prefix for iterating all awards of a pair.
#[must_use]
pub fn award_pair_prefix(venue_id: &VenueId, participant_id: &ParticipantId) -> Vec<u8> {
    pair_key(venue_id, participant_id)
}

/// Create a violation key from a violation ID.
#[must_use]
pub fn violation_key(violation_id: &RecordId) -> Vec<u8> {
    violation_id.to_bytes().to_vec()
}

/// Extract the award ID from an award pair-index key.
///
/// # Panics
///
/// Panics if the key is not at least 48 bytes.
#[must_use]
pub fn extract_award_id_from_pair_key(key: &[u8]) -> RecordId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[32..48]);
    RecordId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Extract the venue ID from a pair key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_venue_id_from_pair_key(key: &[u8]) -> VenueId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[..16]);
    VenueId::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_format() {
        let venue_id = VenueId::generate();
        let participant_id = ParticipantId::generate();
        let key = pair_key(&venue_id, &participant_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], venue_id.as_bytes());
        assert_eq!(&key[16..], participant_id.as_bytes());
    }

    #[test]
    fn award_pair_key_format() {
        let venue_id = VenueId::generate();
        let participant_id = ParticipantId::generate();
        let award_id = RecordId::generate();
        let key = award_pair_key(&venue_id, &participant_id, &award_id);

        assert_eq!(key.len(), 48);
        assert_eq!(&key[..16], venue_id.as_bytes());
        assert_eq!(&key[16..32], participant_id.as_bytes());
        assert_eq!(&key[32..], award_id.to_bytes());
    }

    #[test]
    fn extract_award_id_roundtrip() {
        let venue_id = VenueId::generate();
        let participant_id = ParticipantId::generate();
        let award_id = RecordId::generate();
        let key = award_pair_key(&venue_id, &participant_id, &award_id);

        assert_eq!(extract_award_id_from_pair_key(&key), award_id);
    }

    #[test]
    fn extract_venue_id_roundtrip() {
        let venue_id = VenueId::generate();
        let participant_id = ParticipantId::generate();
        let key = pair_key(&venue_id, &participant_id);

        assert_eq!(extract_venue_id_from_pair_key(&key), venue_id);
    }

    #[test]
    fn venue_prefix_matches_pair_keys() {
        let venue_id = VenueId::generate();
        let participant_id = ParticipantId::generate();
        let key = pair_key(&venue_id, &participant_id);
        let prefix = venue_prefix(&venue_id);

        assert!(key.starts_with(&prefix));
    }
}
