//! Participant types for festa.
//!
//! A participant is an attendee (or staff member) whose visits, points, and
//! ratings are tracked over the course of the festival.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParticipantId;

/// A festival participant.
///
/// The running `visit_count` and `points` counters are only ever incremented,
/// and only in the same atomic write as the visit or award record that
/// justifies the increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// The participant ID.
    pub id: ParticipantId,

    /// Display nickname.
    pub nickname: String,

    /// Role. Only attendees take part in visits, awards, and ratings.
    pub role: Role,

    /// Grade (display only).
    pub grade: u8,

    /// Class number (display only).
    pub class_number: u8,

    /// Student number within the class (display only).
    pub student_number: u8,

    /// Personal scan code, distinct from any venue token. Unique.
    pub qr_token: String,

    /// Number of venues visited. Incremented once per first visit.
    pub visit_count: i64,

    /// Accumulated award points.
    pub points: i64,

    /// When the participant was registered.
    pub created_at: DateTime<Utc>,

    /// When the participant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Participant {
    /// Create a new participant with zeroed counters.
    #[must_use]
    pub fn new(
        nickname: impl Into<String>,
        role: Role,
        grade: u8,
        class_number: u8,
        student_number: u8,
        qr_token: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ParticipantId::generate(),
            nickname: nickname.into(),
            role,
            grade,
            class_number,
            student_number,
            qr_token: qr_token.into(),
            visit_count: 0,
            points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the participant takes part in visits, awards, and ratings.
    #[must_use]
    pub const fn is_attendee(&self) -> bool {
        matches!(self.role, Role::Attendee)
    }

    /// Human-readable grade/class/number label, e.g. `"2-3 #14"`.
    #[must_use]
    pub fn profile_label(&self) -> String {
        profile_label(self.grade, self.class_number, self.student_number)
    }
}

/// Build the display label shared by participants and leaderboard entries.
#[must_use]
pub fn profile_label(grade: u8, class_number: u8, student_number: u8) -> String {
    format!("{grade}-{class_number} #{student_number}")
}

/// Participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A regular attendee. Visits, earns points, and rates venues.
    Attendee,

    /// Venue staff. Operates stations; does not appear on leaderboards.
    Staff,

    /// Event administrator.
    Admin,
}
