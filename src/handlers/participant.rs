// src/handlers/participant.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError, models::participant::RegisterParticipantRequest, store::QuizStore,
};

/// Registers a team. Returns 201 and the stored participant.
pub async fn register(
    State(store): State<Arc<dyn QuizStore>>,
    Json(payload): Json<RegisterParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new_participant = payload.into_new_participant();
    if new_participant.team.is_empty()
        || new_participant.college.is_empty()
        || new_participant.members.is_empty()
    {
        return Err(AppError::BadRequest(
            "Team name, college and at least one member are required".to_string(),
        ));
    }

    let participant = store.create_participant(new_participant).await?;
    tracing::info!(
        "Registered team '{}' ({} members)",
        participant.team,
        participant.members.len()
    );

    Ok((StatusCode::CREATED, Json(participant)))
}
