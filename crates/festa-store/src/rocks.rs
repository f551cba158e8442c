//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store`
//! trait. Compound operations hold the writer lock across their
//! check-then-write section; that lock is the transaction boundary that
//! keeps two concurrent attempts for the same pair from both observing
//! "no existing record".

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use festa_core::{
    AwardRecord, Participant, ParticipantId, RatingRecord, RatingStats, RatingStatus, ReviewPatch,
    Score, Venue, VenueId, ViolationRecord, VisitReceipt, VisitRecord,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Acquire the writer lock guarding compound check-then-write sections.
    fn writer(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("writer lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Append a violation audit record.
    fn put_violation(&self, violation: &ViolationRecord) -> Result<()> {
        let cf = self.cf(cf::VIOLATIONS)?;
        let key = keys::violation_key(&violation.id);
        let value = Self::serialize(violation)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(
            violation_id = %violation.id,
            kind = ?violation.kind,
            venue_id = %violation.venue_id,
            participant_id = %violation.participant_id,
            "Violation recorded"
        );

        Ok(())
    }

    /// Load a participant or fail with `NotFound`.
    fn require_participant(&self, participant_id: &ParticipantId) -> Result<Participant> {
        self.get_participant(participant_id)?
            .ok_or(StoreError::NotFound {
                entity: "participant",
                id: participant_id.to_string(),
            })
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Participant Operations
    // =========================================================================

    fn put_participant(&self, participant: &Participant) -> Result<()> {
        let cf_participants = self.cf(cf::PARTICIPANTS)?;
        let cf_by_token = self.cf(cf::PARTICIPANTS_BY_TOKEN)?;

        let key = keys::participant_key(&participant.id);
        let token_key = keys::token_key(&participant.qr_token);
        let value = Self::serialize(participant)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_participants, &key, &value);
        batch.put_cf(&cf_by_token, &token_key, participant.id.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_participant(&self, participant_id: &ParticipantId) -> Result<Option<Participant>> {
        let cf = self.cf(cf::PARTICIPANTS)?;
        let key = keys::participant_key(participant_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_participant_by_token(&self, token: &str) -> Result<Option<Participant>> {
        let cf = self.cf(cf::PARTICIPANTS_BY_TOKEN)?;

        let Some(id_bytes) = self
            .db
            .get_cf(&cf, keys::token_key(token))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let bytes: [u8; 16] = id_bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Serialization("malformed participant id index".into()))?;

        self.get_participant(&ParticipantId::from_bytes(bytes))
    }

    fn list_participants(&self) -> Result<Vec<Participant>> {
        let cf = self.cf(cf::PARTICIPANTS)?;

        let mut participants = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            participants.push(Self::deserialize(&value)?);
        }

        Ok(participants)
    }

    // =========================================================================
    // Venue Operations
    // =========================================================================

    fn put_venue(&self, venue: &Venue) -> Result<()> {
        let cf_venues = self.cf(cf::VENUES)?;
        let cf_by_token = self.cf(cf::VENUES_BY_TOKEN)?;

        let key = keys::venue_key(&venue.id);
        let token_key = keys::token_key(&venue.qr_token);
        let value = Self::serialize(venue)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_venues, &key, &value);
        batch.put_cf(&cf_by_token, &token_key, venue.id.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_venue(&self, venue_id: &VenueId) -> Result<Option<Venue>> {
        let cf = self.cf(cf::VENUES)?;
        let key = keys::venue_key(venue_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_venue_by_token(&self, token: &str) -> Result<Option<Venue>> {
        let cf = self.cf(cf::VENUES_BY_TOKEN)?;

        let Some(id_bytes) = self
            .db
            .get_cf(&cf, keys::token_key(token))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let bytes: [u8; 16] = id_bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Serialization("malformed venue id index".into()))?;

        self.get_venue(&VenueId::from_bytes(bytes))
    }

    fn list_venues(&self) -> Result<Vec<Venue>> {
        let cf = self.cf(cf::VENUES)?;

        let mut venues = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            venues.push(Self::deserialize(&value)?);
        }

        Ok(venues)
    }

    // =========================================================================
    // Visit Operations
    // =========================================================================

    fn record_visit(&self, visit: &VisitRecord) -> Result<VisitReceipt> {
        let _guard = self.writer()?;

        let mut participant = self.require_participant(&visit.participant_id)?;
        // Only attendees accrue visits.
        if !participant.is_attendee() {
            return Err(StoreError::NotFound {
                entity: "participant",
                id: visit.participant_id.to_string(),
            });
        }

        // Permanent dedup: one visit per pair, ever.
        if let Some(prior) = self.get_visit(&visit.venue_id, &visit.participant_id)? {
            self.put_violation(&ViolationRecord::duplicate_visit(
                visit.venue_id,
                visit.participant_id,
                prior.visited_at,
            ))?;
            return Err(StoreError::DuplicateVisit {
                last_visited_at: prior.visited_at,
            });
        }

        participant.visit_count += 1;
        participant.updated_at = visit.visited_at;

        let cf_visits = self.cf(cf::VISITS)?;
        let cf_participants = self.cf(cf::PARTICIPANTS)?;

        let visit_key = keys::pair_key(&visit.venue_id, &visit.participant_id);
        let participant_key = keys::participant_key(&participant.id);

        let visit_value = Self::serialize(visit)?;
        let participant_value = Self::serialize(&participant)?;

        // Record and counter commit or fail together.
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_visits, &visit_key, &visit_value);
        batch.put_cf(&cf_participants, &participant_key, &participant_value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rating = self.get_rating(&visit.venue_id, &visit.participant_id)?;

        Ok(VisitReceipt {
            visit: visit.clone(),
            total_visit_count: participant.visit_count,
            rating: RatingStatus {
                venue_id: visit.venue_id,
                has_rated: rating.is_some(),
                score: rating.map(|r| r.score),
            },
        })
    }

    fn get_visit(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
    ) -> Result<Option<VisitRecord>> {
        let cf = self.cf(cf::VISITS)?;
        let key = keys::pair_key(venue_id, participant_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn visit_counts_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<HashMap<VenueId, u64>> {
        let cf = self.cf(cf::VISITS)?;

        let mut counts: HashMap<VenueId, u64> = HashMap::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let visit: VisitRecord = Self::deserialize(&value)?;

            if let Some(cutoff) = since {
                if visit.visited_at < cutoff {
                    continue;
                }
            }

            *counts.entry(visit.venue_id).or_insert(0) += 1;
        }

        Ok(counts)
    }

    // =========================================================================
    // Award Operations
    // =========================================================================

    fn record_award(&self, award: &AwardRecord, window: Duration) -> Result<i64> {
        let _guard = self.writer()?;

        let mut participant = self.require_participant(&award.participant_id)?;

        // Windowed dedup: re-eligible once the prior award leaves the window.
        let window_start = award.awarded_at - window;
        if let Some(prior) = self.latest_award(&award.venue_id, &award.participant_id)? {
            if prior.awarded_at >= window_start {
                let available_at = prior.awarded_at + window;
                self.put_violation(&ViolationRecord::duplicate_award(
                    award.venue_id,
                    award.participant_id,
                    prior.awarded_at,
                    available_at,
                ))?;
                return Err(StoreError::DuplicateAward { available_at });
            }
        }

        participant.points += award.points;
        participant.updated_at = award.awarded_at;

        let cf_awards = self.cf(cf::AWARDS)?;
        let cf_by_pair = self.cf(cf::AWARDS_BY_PAIR)?;
        let cf_participants = self.cf(cf::PARTICIPANTS)?;

        let award_key = keys::award_key(&award.id);
        let pair_key = keys::award_pair_key(&award.venue_id, &award.participant_id, &award.id);
        let participant_key = keys::participant_key(&participant.id);

        let award_value = Self::serialize(award)?;
        let participant_value = Self::serialize(&participant)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_awards, &award_key, &award_value);
        batch.put_cf(&cf_by_pair, &pair_key, []); // Index entry (empty value)
        batch.put_cf(&cf_participants, &participant_key, &participant_value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(participant.points)
    }

    fn latest_award(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
    ) -> Result<Option<AwardRecord>> {
        let cf_by_pair = self.cf(cf::AWARDS_BY_PAIR)?;
        let prefix = keys::award_pair_prefix(venue_id, participant_id);

        // ULID suffixes sort chronologically, so the last matching index key
        // is the most recent award.
        let mut newest: Option<Vec<u8>> = None;
        let iter = self
            .db
            .iterator_cf(&cf_by_pair, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            newest = Some(key.to_vec());
        }

        let Some(key) = newest else {
            return Ok(None);
        };

        let award_id = keys::extract_award_id_from_pair_key(&key);
        let cf_awards = self.cf(cf::AWARDS)?;
        self.db
            .get_cf(&cf_awards, keys::award_key(&award_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Rating Operations
    // =========================================================================

    fn create_rating(&self, rating: &RatingRecord) -> Result<()> {
        let _guard = self.writer()?;

        if self
            .get_visit(&rating.venue_id, &rating.participant_id)?
            .is_none()
        {
            return Err(StoreError::MissingVisitHistory {
                venue_id: rating.venue_id,
                participant_id: rating.participant_id,
            });
        }

        if self
            .get_rating(&rating.venue_id, &rating.participant_id)?
            .is_some()
        {
            return Err(StoreError::RatingConflict {
                venue_id: rating.venue_id,
                participant_id: rating.participant_id,
            });
        }

        let cf = self.cf(cf::RATINGS)?;
        let key = keys::pair_key(&rating.venue_id, &rating.participant_id);
        let value = Self::serialize(rating)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn update_rating(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
        score: Score,
        review: &ReviewPatch,
        now: DateTime<Utc>,
        edit_window: Duration,
    ) -> Result<RatingRecord> {
        let _guard = self.writer()?;

        let mut rating =
            self.get_rating(venue_id, participant_id)?
                .ok_or(StoreError::RatingNotFound {
                    venue_id: *venue_id,
                    participant_id: *participant_id,
                })?;

        // The edit window is measured from the visit, not from the rating.
        let visit = self.get_visit(venue_id, participant_id)?.ok_or(
            StoreError::MissingVisitHistory {
                venue_id: *venue_id,
                participant_id: *participant_id,
            },
        )?;

        let expires_at = visit.visited_at + edit_window;
        if now >= expires_at {
            return Err(StoreError::EditWindowExpired {
                expired_at: expires_at,
            });
        }

        rating.score = score.get();
        rating.review = review.apply(rating.review.take());
        rating.updated_at = now;

        let cf = self.cf(cf::RATINGS)?;
        let key = keys::pair_key(venue_id, participant_id);
        let value = Self::serialize(&rating)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rating)
    }

    fn get_rating(
        &self,
        venue_id: &VenueId,
        participant_id: &ParticipantId,
    ) -> Result<Option<RatingRecord>> {
        let cf = self.cf(cf::RATINGS)?;
        let key = keys::pair_key(venue_id, participant_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    #[allow(clippy::cast_precision_loss)]
    fn rating_stats(
        &self,
        venue_ids: Option<&[VenueId]>,
    ) -> Result<HashMap<VenueId, RatingStats>> {
        // An explicit empty filter never touches the database.
        if let Some(ids) = venue_ids {
            if ids.is_empty() {
                return Ok(HashMap::new());
            }
        }

        let cf = self.cf(cf::RATINGS)?;
        let mut sums: HashMap<VenueId, (u64, u64)> = HashMap::new();

        match venue_ids {
            Some(ids) => {
                for venue_id in ids {
                    let prefix = keys::venue_prefix(venue_id);
                    let iter = self
                        .db
                        .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));
                    for item in iter {
                        let (key, value) =
                            item.map_err(|e| StoreError::Database(e.to_string()))?;
                        if !key.starts_with(&prefix) {
                            break;
                        }
                        let rating: RatingRecord = Self::deserialize(&value)?;
                        let entry = sums.entry(*venue_id).or_insert((0, 0));
                        entry.0 += u64::from(rating.score);
                        entry.1 += 1;
                    }
                }
            }
            None => {
                for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
                    let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                    let venue_id = keys::extract_venue_id_from_pair_key(&key);
                    let rating: RatingRecord = Self::deserialize(&value)?;
                    let entry = sums.entry(venue_id).or_insert((0, 0));
                    entry.0 += u64::from(rating.score);
                    entry.1 += 1;
                }
            }
        }

        Ok(sums
            .into_iter()
            .map(|(venue_id, (sum, count))| {
                (
                    venue_id,
                    RatingStats {
                        average: sum as f64 / count as f64,
                        count,
                    },
                )
            })
            .collect())
    }

    #[allow(clippy::cast_precision_loss)]
    fn rating_stats_since(
        &self,
        venue_id: &VenueId,
        since: DateTime<Utc>,
    ) -> Result<Option<RatingStats>> {
        let cf = self.cf(cf::RATINGS)?;
        let prefix = keys::venue_prefix(venue_id);

        let mut sum = 0u64;
        let mut count = 0u64;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            let rating: RatingRecord = Self::deserialize(&value)?;
            if rating.created_at < since {
                continue;
            }
            sum += u64::from(rating.score);
            count += 1;
        }

        if count == 0 {
            return Ok(None);
        }

        Ok(Some(RatingStats {
            average: sum as f64 / count as f64,
            count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use festa_core::{Role, ViolationKind};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn seed_attendee(store: &RocksStore, nickname: &str, token: &str) -> Participant {
        let participant = Participant::new(nickname, Role::Attendee, 1, 2, 3, token);
        store.put_participant(&participant).unwrap();
        participant
    }

    fn seed_venue(store: &RocksStore, name: &str, token: &str) -> Venue {
        let venue = Venue::new(name, "somewhere", token);
        store.put_venue(&venue).unwrap();
        venue
    }

    fn count_violations(store: &RocksStore) -> usize {
        let cf = store.cf(cf::VIOLATIONS).unwrap();
        store.db.iterator_cf(&cf, IteratorMode::Start).count()
    }

    fn read_violations(store: &RocksStore) -> Vec<ViolationRecord> {
        let cf = store.cf(cf::VIOLATIONS).unwrap();
        store
            .db
            .iterator_cf(&cf, IteratorMode::Start)
            .map(|item| {
                let (_, value) = item.unwrap();
                RocksStore::deserialize(&value).unwrap()
            })
            .collect()
    }

    // =========================================================================
    // Token resolution
    // =========================================================================

    #[test]
    fn participant_token_lookup() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");

        let found = store.find_participant_by_token("p-tok-1").unwrap().unwrap();
        assert_eq!(found.id, participant.id);

        assert!(store.find_participant_by_token("missing").unwrap().is_none());
    }

    #[test]
    fn venue_token_lookup() {
        let (store, _dir) = create_test_store();
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let found = store.find_venue_by_token("v-tok-1").unwrap().unwrap();
        assert_eq!(found.id, venue.id);

        assert!(store.find_venue_by_token("missing").unwrap().is_none());
    }

    // =========================================================================
    // Visit recording
    // =========================================================================

    #[test]
    fn first_visit_increments_counter() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let visit = VisitRecord::new(venue.id, participant.id);
        let receipt = store.record_visit(&visit).unwrap();

        assert_eq!(receipt.total_visit_count, 1);
        assert!(!receipt.rating.has_rated);
        assert_eq!(receipt.rating.venue_id, venue.id);

        let stored = store.get_participant(&participant.id).unwrap().unwrap();
        assert_eq!(stored.visit_count, 1);
    }

    #[test]
    fn second_visit_rejected_with_original_timestamp() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let first = VisitRecord::new(venue.id, participant.id);
        store.record_visit(&first).unwrap();

        let second = VisitRecord::new(venue.id, participant.id);
        let err = store.record_visit(&second).unwrap_err();
        match err {
            StoreError::DuplicateVisit { last_visited_at } => {
                assert_eq!(last_visited_at, first.visited_at);
            }
            other => panic!("expected DuplicateVisit, got {other:?}"),
        }

        // Exactly one stored record, one counter increment.
        let stored = store.get_participant(&participant.id).unwrap().unwrap();
        assert_eq!(stored.visit_count, 1);
        let kept = store.get_visit(&venue.id, &participant.id).unwrap().unwrap();
        assert_eq!(kept.visited_at, first.visited_at);
    }

    #[test]
    fn duplicate_visit_writes_violation() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let first = VisitRecord::new(venue.id, participant.id);
        store.record_visit(&first).unwrap();
        assert_eq!(count_violations(&store), 0);

        let _ = store.record_visit(&VisitRecord::new(venue.id, participant.id));
        let violations = read_violations(&store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DuplicateVisit);
        assert_eq!(violations[0].last_occurred_at, first.visited_at);
        // A permanent duplicate has no "eligible again" time.
        assert_eq!(violations[0].available_at, first.visited_at);
    }

    #[test]
    fn visits_to_distinct_venues_both_count() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue_a = seed_venue(&store, "A", "v-a");
        let venue_b = seed_venue(&store, "B", "v-b");

        store
            .record_visit(&VisitRecord::new(venue_a.id, participant.id))
            .unwrap();
        let receipt = store
            .record_visit(&VisitRecord::new(venue_b.id, participant.id))
            .unwrap();

        assert_eq!(receipt.total_visit_count, 2);
    }

    #[test]
    fn visit_for_unknown_participant_fails() {
        let (store, _dir) = create_test_store();
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let visit = VisitRecord::new(venue.id, ParticipantId::generate());
        assert!(matches!(
            store.record_visit(&visit),
            Err(StoreError::NotFound { entity: "participant", .. })
        ));
    }

    #[test]
    fn staff_cannot_accrue_visits() {
        let (store, _dir) = create_test_store();
        let staff = Participant::new("sensei", Role::Staff, 0, 0, 0, "s-tok");
        store.put_participant(&staff).unwrap();
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let visit = VisitRecord::new(venue.id, staff.id);
        assert!(matches!(
            store.record_visit(&visit),
            Err(StoreError::NotFound { entity: "participant", .. })
        ));
    }

    #[test]
    fn visit_receipt_reports_existing_rating() {
        let (store, _dir) = create_test_store();
        let rater = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        store
            .record_visit(&VisitRecord::new(venue.id, rater.id))
            .unwrap();
        store
            .create_rating(&RatingRecord::new(
                venue.id,
                rater.id,
                Score::try_from_f64(4.0).unwrap(),
                None,
            ))
            .unwrap();

        // A duplicate scan reports the rating state in its error path; a
        // fresh visitor sees has_rated=false. Check the happy path through a
        // second participant visiting after the first has rated.
        let other = seed_attendee(&store, "rin", "p-tok-2");
        let receipt = store
            .record_visit(&VisitRecord::new(venue.id, other.id))
            .unwrap();
        assert!(!receipt.rating.has_rated);

        let rating = store.get_rating(&venue.id, &rater.id).unwrap().unwrap();
        assert_eq!(rating.score, 4);
    }

    #[test]
    fn visit_counts_since_filters_by_cutoff() {
        let (store, _dir) = create_test_store();
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let old_visitor = seed_attendee(&store, "old", "p-old");
        let new_visitor = seed_attendee(&store, "new", "p-new");

        let mut old_visit = VisitRecord::new(venue.id, old_visitor.id);
        old_visit.visited_at = Utc::now() - Duration::hours(2);
        store.record_visit(&old_visit).unwrap();
        store
            .record_visit(&VisitRecord::new(venue.id, new_visitor.id))
            .unwrap();

        let all_time = store.visit_counts_since(None).unwrap();
        assert_eq!(all_time.get(&venue.id), Some(&2));

        let recent = store
            .visit_counts_since(Some(Utc::now() - Duration::minutes(30)))
            .unwrap();
        assert_eq!(recent.get(&venue.id), Some(&1));

        let none = store
            .visit_counts_since(Some(Utc::now() + Duration::minutes(1)))
            .unwrap();
        assert!(none.is_empty());
    }

    // =========================================================================
    // Award throttling
    // =========================================================================

    #[test]
    fn award_inside_window_rejected() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let window = Duration::minutes(30);

        let first = AwardRecord::new(venue.id, participant.id, 10);
        assert_eq!(store.record_award(&first, window).unwrap(), 10);

        // Ten minutes later: still inside the window.
        let mut second = AwardRecord::new(venue.id, participant.id, 10);
        second.awarded_at = first.awarded_at + Duration::minutes(10);
        let err = store.record_award(&second, window).unwrap_err();
        match err {
            StoreError::DuplicateAward { available_at } => {
                assert_eq!(available_at, first.awarded_at + window);
            }
            other => panic!("expected DuplicateAward, got {other:?}"),
        }

        // Exactly one increment.
        let stored = store.get_participant(&participant.id).unwrap().unwrap();
        assert_eq!(stored.points, 10);
    }

    #[test]
    fn award_after_window_succeeds_again() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let window = Duration::minutes(30);

        let first = AwardRecord::new(venue.id, participant.id, 10);
        store.record_award(&first, window).unwrap();

        let mut third = AwardRecord::new(venue.id, participant.id, 10);
        third.awarded_at = first.awarded_at + Duration::minutes(31);
        assert_eq!(store.record_award(&third, window).unwrap(), 20);

        let stored = store.get_participant(&participant.id).unwrap().unwrap();
        assert_eq!(stored.points, 20);
    }

    #[test]
    fn duplicate_award_writes_retryable_violation() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let window = Duration::minutes(30);

        let first = AwardRecord::new(venue.id, participant.id, 10);
        store.record_award(&first, window).unwrap();

        let mut second = AwardRecord::new(venue.id, participant.id, 10);
        second.awarded_at = first.awarded_at + Duration::minutes(5);
        let _ = store.record_award(&second, window);

        let violations = read_violations(&store);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::DuplicateAward);
        assert!(violations[0].kind.is_retryable());
        assert_eq!(violations[0].available_at, first.awarded_at + window);
    }

    #[test]
    fn awards_at_different_venues_are_independent() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue_a = seed_venue(&store, "A", "v-a");
        let venue_b = seed_venue(&store, "B", "v-b");
        let window = Duration::minutes(30);

        store
            .record_award(&AwardRecord::new(venue_a.id, participant.id, 10), window)
            .unwrap();
        let points = store
            .record_award(&AwardRecord::new(venue_b.id, participant.id, 10), window)
            .unwrap();

        assert_eq!(points, 20);
    }

    #[test]
    fn latest_award_returns_most_recent() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let window = Duration::minutes(30);

        let first = AwardRecord::new(venue.id, participant.id, 10);
        store.record_award(&first, window).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2)); // Ensure different ULIDs

        let mut second = AwardRecord::new(venue.id, participant.id, 10);
        second.awarded_at = first.awarded_at + Duration::minutes(45);
        store.record_award(&second, window).unwrap();

        let latest = store
            .latest_award(&venue.id, &participant.id)
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.id);
    }

    // =========================================================================
    // Ratings
    // =========================================================================

    #[test]
    fn rating_requires_prior_visit() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let rating = RatingRecord::new(
            venue.id,
            participant.id,
            Score::try_from_f64(4.0).unwrap(),
            None,
        );
        assert!(matches!(
            store.create_rating(&rating),
            Err(StoreError::MissingVisitHistory { .. })
        ));
    }

    #[test]
    fn second_rating_conflicts() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        store
            .record_visit(&VisitRecord::new(venue.id, participant.id))
            .unwrap();

        let rating = RatingRecord::new(
            venue.id,
            participant.id,
            Score::try_from_f64(4.0).unwrap(),
            Some("nice".into()),
        );
        store.create_rating(&rating).unwrap();

        assert!(matches!(
            store.create_rating(&rating),
            Err(StoreError::RatingConflict { .. })
        ));
    }

    #[test]
    fn update_requires_existing_rating() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");

        let result = store.update_rating(
            &venue.id,
            &participant.id,
            Score::try_from_f64(4.0).unwrap(),
            &ReviewPatch::Keep,
            Utc::now(),
            Duration::hours(24),
        );
        assert!(matches!(result, Err(StoreError::RatingNotFound { .. })));
    }

    #[test]
    fn update_respects_edit_window_boundary() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let window = Duration::hours(24);

        let visit = VisitRecord::new(venue.id, participant.id);
        store.record_visit(&visit).unwrap();
        store
            .create_rating(&RatingRecord::new(
                venue.id,
                participant.id,
                Score::try_from_f64(3.0).unwrap(),
                None,
            ))
            .unwrap();

        // One millisecond before expiry: allowed.
        let just_inside = visit.visited_at + window - Duration::milliseconds(1);
        let updated = store
            .update_rating(
                &venue.id,
                &participant.id,
                Score::try_from_f64(5.0).unwrap(),
                &ReviewPatch::Keep,
                just_inside,
                window,
            )
            .unwrap();
        assert_eq!(updated.score, 5);

        // One millisecond after expiry: rejected.
        let just_outside = visit.visited_at + window + Duration::milliseconds(1);
        let err = store
            .update_rating(
                &venue.id,
                &participant.id,
                Score::try_from_f64(2.0).unwrap(),
                &ReviewPatch::Keep,
                just_outside,
                window,
            )
            .unwrap_err();
        match err {
            StoreError::EditWindowExpired { expired_at } => {
                assert_eq!(expired_at, visit.visited_at + window);
            }
            other => panic!("expected EditWindowExpired, got {other:?}"),
        }
    }

    #[test]
    fn update_review_tri_state() {
        let (store, _dir) = create_test_store();
        let participant = seed_attendee(&store, "mika", "p-tok-1");
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let window = Duration::hours(24);
        let score = Score::try_from_f64(4.0).unwrap();

        store
            .record_visit(&VisitRecord::new(venue.id, participant.id))
            .unwrap();
        store
            .create_rating(&RatingRecord::new(
                venue.id,
                participant.id,
                score,
                Some("original".into()),
            ))
            .unwrap();

        // Omitted: untouched.
        let kept = store
            .update_rating(
                &venue.id,
                &participant.id,
                score,
                &ReviewPatch::Keep,
                Utc::now(),
                window,
            )
            .unwrap();
        assert_eq!(kept.review.as_deref(), Some("original"));

        // Provided text: trimmed replacement.
        let replaced = store
            .update_rating(
                &venue.id,
                &participant.id,
                score,
                &ReviewPatch::Set("  ok  ".into()),
                Utc::now(),
                window,
            )
            .unwrap();
        assert_eq!(replaced.review.as_deref(), Some("ok"));

        // Explicit null: cleared.
        let cleared = store
            .update_rating(
                &venue.id,
                &participant.id,
                score,
                &ReviewPatch::Clear,
                Utc::now(),
                window,
            )
            .unwrap();
        assert_eq!(cleared.review, None);
    }

    #[test]
    fn rating_stats_aggregate_and_short_circuit() {
        let (store, _dir) = create_test_store();
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let other = seed_venue(&store, "Cafe", "v-tok-2");

        for (i, score) in [5.0, 3.0].iter().enumerate() {
            let p = seed_attendee(&store, &format!("p{i}"), &format!("p-tok-{i}"));
            store
                .record_visit(&VisitRecord::new(venue.id, p.id))
                .unwrap();
            store
                .create_rating(&RatingRecord::new(
                    venue.id,
                    p.id,
                    Score::try_from_f64(*score).unwrap(),
                    None,
                ))
                .unwrap();
        }

        // Explicit empty filter: empty map, no store scan.
        assert!(store.rating_stats(Some(&[])).unwrap().is_empty());

        // Full aggregate.
        let all = store.rating_stats(None).unwrap();
        let stats = all.get(&venue.id).unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.average - 4.0).abs() < f64::EPSILON);
        assert!(!all.contains_key(&other.id));

        // Subset aggregate.
        let subset = store.rating_stats(Some(&[venue.id, other.id])).unwrap();
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.get(&venue.id).unwrap().count, 2);
    }

    #[test]
    fn rating_stats_since_filters_on_creation() {
        let (store, _dir) = create_test_store();
        let venue = seed_venue(&store, "Planetarium", "v-tok-1");
        let p = seed_attendee(&store, "mika", "p-tok-1");

        store
            .record_visit(&VisitRecord::new(venue.id, p.id))
            .unwrap();
        let mut rating = RatingRecord::new(
            venue.id,
            p.id,
            Score::try_from_f64(5.0).unwrap(),
            None,
        );
        rating.created_at = Utc::now() - Duration::hours(3);
        store.create_rating(&rating).unwrap();

        let recent = store
            .rating_stats_since(&venue.id, Utc::now() - Duration::minutes(30))
            .unwrap();
        assert!(recent.is_none());

        let wide = store
            .rating_stats_since(&venue.id, Utc::now() - Duration::hours(4))
            .unwrap()
            .unwrap();
        assert_eq!(wide.count, 1);
    }
}
