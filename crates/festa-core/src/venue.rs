//! Venue types for festa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::VenueId;

/// A booth or station participants visit in person.
///
/// Venues are immutable once registered; profile edits happen outside the
/// ledger core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    /// The venue ID.
    pub id: VenueId,

    /// Display name.
    pub name: String,

    /// Physical location description.
    pub location: String,

    /// Venue scan token printed at the station. Unique.
    pub qr_token: String,

    /// When the venue was registered.
    pub created_at: DateTime<Utc>,
}

impl Venue {
    /// Create a new venue.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        qr_token: impl Into<String>,
    ) -> Self {
        Self {
            id: VenueId::generate(),
            name: name.into(),
            location: location.into(),
            qr_token: qr_token.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_venue_keeps_token() {
        let venue = Venue::new("Planetarium", "Building B, 3F", "v-token-1");
        assert_eq!(venue.qr_token, "v-token-1");
        assert_eq!(venue.name, "Planetarium");
    }
}
