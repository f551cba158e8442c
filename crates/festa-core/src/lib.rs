//! Core types and ranking engines for festa.
//!
//! This crate provides the foundational types used throughout the festa
//! attendance ledger:
//!
//! - **Identifiers**: `ParticipantId`, `VenueId`, `RecordId`
//! - **Entities**: `Participant`, `Venue`
//! - **Ledger records**: `VisitRecord`, `AwardRecord`, `RatingRecord`,
//!   `ViolationRecord`
//! - **Engines**: `leaderboard::rank`, `trending::score_venues`
//! - **Configuration**: `FestivalConfig`
//!
//! # Integrity model
//!
//! A participant visits a venue at most once, ever; repeat awards for the
//! same pair are rejected inside a rolling throttle window; ratings require
//! a prior visit and stay editable only inside a window measured from the
//! visit. Every rejection is audited as a `ViolationRecord`. The ranking
//! engines are pure functions over snapshots and never touch storage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod ids;
pub mod leaderboard;
pub mod ledger;
pub mod participant;
pub mod trending;
pub mod venue;

pub use config::FestivalConfig;
pub use ids::{IdError, ParticipantId, RecordId, VenueId};
pub use ledger::{
    AwardRecord, RatingRecord, RatingStats, RatingStatus, ReviewPatch, Score, ScoreError,
    ViolationKind, ViolationRecord, VisitReceipt, VisitRecord, SCORE_MAX, SCORE_MIN,
};
pub use participant::{Participant, Role};
pub use venue::Venue;
