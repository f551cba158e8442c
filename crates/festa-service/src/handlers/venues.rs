//! Venue registration and listing handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use festa_core::Venue;
use festa_store::Store;

use crate::auth::StationAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Venue registration request.
#[derive(Debug, Deserialize)]
pub struct CreateVenueRequest {
    /// Display name.
    pub name: String,
    /// Physical location description.
    pub location: String,
    /// Venue scan token. Must be unique.
    pub qr_token: String,
}

/// Venue response.
#[derive(Debug, Serialize)]
pub struct VenueResponse {
    /// Venue ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Physical location description.
    pub location: String,
    /// Registration timestamp.
    pub created_at: String,
}

impl From<&Venue> for VenueResponse {
    fn from(v: &Venue) -> Self {
        Self {
            id: v.id.to_string(),
            name: v.name.clone(),
            location: v.location.clone(),
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

/// Register a venue.
pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    auth: StationAuth,
    Json(body): Json<CreateVenueRequest>,
) -> Result<(StatusCode, Json<VenueResponse>), ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    if body.qr_token.trim().is_empty() {
        return Err(ApiError::BadRequest("qr_token must not be empty".into()));
    }

    if state.store.find_venue_by_token(&body.qr_token)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "qr token already registered: {}",
            body.qr_token
        )));
    }

    let venue = Venue::new(body.name, body.location, body.qr_token);
    state.store.put_venue(&venue)?;

    tracing::info!(
        venue_id = %venue.id,
        name = %venue.name,
        station = %auth.station_name,
        "Venue registered"
    );

    Ok((StatusCode::CREATED, Json(VenueResponse::from(&venue))))
}

/// List venues response.
#[derive(Debug, Serialize)]
pub struct ListVenuesResponse {
    /// All registered venues.
    pub venues: Vec<VenueResponse>,
}

/// List all venues.
pub async fn list_venues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListVenuesResponse>, ApiError> {
    let venues = state.store.list_venues()?;

    Ok(Json(ListVenuesResponse {
        venues: venues.iter().map(VenueResponse::from).collect(),
    }))
}
