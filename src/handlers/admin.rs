// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::ScopedCache,
    error::AppError,
    models::quiz::{CreateQuizRequest, Quiz, QuizPatch},
    reports,
    state::AppState,
    store::QuizStore,
    wizard::{QuizWizard, WizardError, WizardProgress},
};

/// Lists all quizzes, newest first.
/// Admin only.
pub async fn list_quizzes(
    State(store): State<Arc<dyn QuizStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_quizzes().await?))
}

/// Creates a quiz in one request.
///
/// Runs the authoring wizard over the submitted questions, so validation and
/// code generation match the step-by-step flow. The new quiz starts as Draft.
/// Admin only.
pub async fn create_quiz(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let cache = Arc::new(ScopedCache::new(
        state.cache.clone(),
        format!("wizard-{}", Uuid::new_v4()),
    ));
    let mut wizard = QuizWizard::new(state.store.clone(), cache);

    match author_quiz(&mut wizard, payload).await {
        Ok(quiz) => Ok((StatusCode::CREATED, Json(quiz))),
        Err(e) => {
            if let Err(discard_err) = wizard.discard().await {
                tracing::warn!("Failed to discard quiz draft: {}", discard_err);
            }
            Err(e.into())
        }
    }
}

async fn author_quiz(
    wizard: &mut QuizWizard,
    payload: CreateQuizRequest,
) -> Result<Quiz, WizardError> {
    wizard
        .set_metadata(
            &payload.title,
            payload.questions.len() as i64,
            payload.time_limit_minutes,
        )
        .await?;

    for question in payload.questions {
        if let WizardProgress::Persisted(quiz) = wizard.save_current_question(question).await? {
            return Ok(quiz);
        }
    }

    Err(WizardError::InvalidState("finish a quiz with missing questions"))
}

/// Updates title, duration, status or questions of a quiz.
/// Admin only.
pub async fn update_quiz(
    State(store): State<Arc<dyn QuizStore>>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizPatch>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    if let Some(questions) = &payload.questions {
        if questions.is_empty() {
            return Err(AppError::BadRequest(
                "A quiz needs at least one question".to_string(),
            ));
        }
        if let Some(bad) = questions.iter().position(|q| {
            q.correct_option >= q.options.len()
                || q.prompt.trim().is_empty()
                || q.options.iter().any(|o| o.trim().is_empty())
        }) {
            return Err(AppError::BadRequest(format!(
                "Question {} is incomplete",
                bad + 1
            )));
        }
    }

    let quiz = store.update_quiz(id, payload).await?;
    tracing::info!("Quiz {} updated (status {})", quiz.id, quiz.status);

    Ok(Json(quiz))
}

/// Deletes a quiz by ID.
/// Admin only.
pub async fn delete_quiz(
    State(store): State<Arc<dyn QuizStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_quiz(id).await?;
    tracing::info!("Quiz {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct ParticipantsQuery {
    /// Case-insensitive match against team or college.
    pub q: Option<String>,
}

/// Lists registered teams, most recent first.
/// Admin only.
pub async fn list_participants(
    State(store): State<Arc<dyn QuizStore>>,
    Query(query): Query<ParticipantsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut participants = store.list_participants().await?;

    if let Some(term) = query.q.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty()) {
        participants.retain(|p| {
            p.team.to_lowercase().contains(&term) || p.college.to_lowercase().contains(&term)
        });
    }

    Ok(Json(participants))
}

/// Admin only.
pub async fn delete_participant(
    State(store): State<Arc<dyn QuizStore>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_participant(id).await?;
    tracing::info!("Participant {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Headline numbers for the admin dashboard.
/// Admin only.
pub async fn dashboard(
    State(store): State<Arc<dyn QuizStore>>,
) -> Result<impl IntoResponse, AppError> {
    let participants = store.list_participants().await?;
    let quizzes = store.list_quizzes().await?;
    let results = store.list_quiz_results(None).await?;

    Ok(Json(reports::dashboard(
        &participants,
        &quizzes,
        &results,
        Utc::now(),
    )))
}
