// src/handlers/feedback.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::feedback::{CreateFeedbackRequest, NewFeedback},
    reports,
    store::QuizStore,
};

pub async fn submit_feedback(
    State(store): State<Arc<dyn QuizStore>>,
    Json(payload): Json<CreateFeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new_feedback = NewFeedback::from(payload);
    if new_feedback.team.is_empty() || new_feedback.comment.is_empty() {
        return Err(AppError::BadRequest(
            "Team and comment are required".to_string(),
        ));
    }

    let feedback = store.create_feedback(new_feedback).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

/// All feedback with its summary.
/// Admin only.
pub async fn list_feedback(
    State(store): State<Arc<dyn QuizStore>>,
) -> Result<impl IntoResponse, AppError> {
    let feedback = store.list_feedback().await?;
    let summary = reports::summarize_feedback(&feedback);

    Ok(Json(json!({
        "summary": summary,
        "entries": feedback,
    })))
}
