// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::quiz::PublicQuiz,
    store::QuizStore,
    utils::code::normalize_quiz_code,
};

/// Looks a quiz up by the code a participant typed.
///
/// The response never includes correct answers.
pub async fn get_quiz_by_code(
    State(store): State<Arc<dyn QuizStore>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let code = normalize_quiz_code(&code)?;

    let quiz = store.get_quiz_by_code(&code).await?.ok_or_else(|| {
        AppError::NotFound("Invalid quiz code. Please check with your admin.".to_string())
    })?;

    Ok(Json(PublicQuiz::from(&quiz)))
}
