//! Participant registration and lookup handlers.
//!
//! This is the minimal per-station seeding surface; bulk provisioning
//! happens outside this service.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use festa_core::{Participant, ParticipantId, Role};
use festa_store::Store;

use crate::auth::StationAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Participant registration request.
#[derive(Debug, Deserialize)]
pub struct CreateParticipantRequest {
    /// Display nickname.
    pub nickname: String,
    /// Role (default: attendee).
    #[serde(default)]
    pub role: Option<Role>,
    /// Grade.
    pub grade: u8,
    /// Class number.
    pub class_number: u8,
    /// Student number.
    pub student_number: u8,
    /// Personal scan code. Must be unique.
    pub qr_token: String,
}

/// Participant response.
#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    /// Participant ID.
    pub id: String,
    /// Display nickname.
    pub nickname: String,
    /// Role.
    pub role: Role,
    /// Human-readable grade/class/number label.
    pub profile_label: String,
    /// Number of venues visited.
    pub visit_count: i64,
    /// Accumulated points.
    pub points: i64,
    /// Registration timestamp.
    pub created_at: String,
}

impl From<&Participant> for ParticipantResponse {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.to_string(),
            nickname: p.nickname.clone(),
            role: p.role,
            profile_label: p.profile_label(),
            visit_count: p.visit_count,
            points: p.points,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Register a participant.
pub async fn create_participant(
    State(state): State<Arc<AppState>>,
    auth: StationAuth,
    Json(body): Json<CreateParticipantRequest>,
) -> Result<(StatusCode, Json<ParticipantResponse>), ApiError> {
    if body.nickname.trim().is_empty() {
        return Err(ApiError::BadRequest("nickname must not be empty".into()));
    }
    if body.qr_token.trim().is_empty() {
        return Err(ApiError::BadRequest("qr_token must not be empty".into()));
    }

    if state
        .store
        .find_participant_by_token(&body.qr_token)?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "qr token already registered: {}",
            body.qr_token
        )));
    }

    let participant = Participant::new(
        body.nickname,
        body.role.unwrap_or(Role::Attendee),
        body.grade,
        body.class_number,
        body.student_number,
        body.qr_token,
    );
    state.store.put_participant(&participant)?;

    tracing::info!(
        participant_id = %participant.id,
        role = ?participant.role,
        station = %auth.station_name,
        "Participant registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(ParticipantResponse::from(&participant)),
    ))
}

/// Get a participant by ID.
pub async fn get_participant(
    State(state): State<Arc<AppState>>,
    Path(participant_id): Path<ParticipantId>,
) -> Result<Json<ParticipantResponse>, ApiError> {
    let participant = state
        .store
        .get_participant(&participant_id)?
        .ok_or_else(|| ApiError::NotFound(format!("participant not found: {participant_id}")))?;

    Ok(Json(ParticipantResponse::from(&participant)))
}
