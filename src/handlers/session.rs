// src/handlers/session.rs

//! Participant-facing quiz sessions hosted by the server.

use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    cache::{self, ScopedCache, SessionCache, keys},
    config::TICK_PERIOD_SECONDS,
    error::AppError,
    models::participant::TeamIdentity,
    session::{Countdown, IntervalTicks, SessionHandle, SubmitOutcome},
    state::AppState,
    utils::code::normalize_quiz_code,
};

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub code: String,
    pub participant_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_index: usize,
    pub option_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub index: usize,
}

async fn live_session(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

/// Starts a session for the quiz behind `code` and its countdown.
///
/// The quiz and team identity go through the session's own cache scope,
/// which also holds its recovery log.
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let code = normalize_quiz_code(&payload.code)?;
    let quiz = state.store.get_quiz_by_code(&code).await?.ok_or_else(|| {
        AppError::NotFound("Invalid quiz code. Please check with your admin.".to_string())
    })?;

    let id = Uuid::new_v4();
    let scoped: Arc<dyn SessionCache> = Arc::new(ScopedCache::new(
        state.cache.clone(),
        format!("session-{}", id),
    ));

    if let Some(participant_id) = payload.participant_id {
        let participant = state
            .store
            .get_participant(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        cache::set_json(scoped.as_ref(), keys::TEAM, &TeamIdentity::from(&participant)).await?;
    }
    cache::set_json(scoped.as_ref(), keys::CURRENT_QUIZ, &quiz).await?;

    let handle = SessionHandle::load(id, state.store.clone(), scoped).await?;
    let countdown = Countdown::start(
        handle.clone(),
        IntervalTicks::every(Duration::from_secs(TICK_PERIOD_SECONDS)),
    );
    state.sessions.insert(handle.clone(), countdown).await;

    tracing::info!("Session {} started for quiz {}", id, quiz.code);

    Ok((StatusCode::CREATED, Json(handle.view().await)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = live_session(&state, id).await?;
    Ok(Json(handle.view().await))
}

pub async fn answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = live_session(&state, id).await?;
    let view = handle
        .select_answer(payload.question_index, payload.option_index)
        .await?;
    Ok(Json(view))
}

pub async fn navigate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = live_session(&state, id).await?;
    Ok(Json(handle.navigate(payload.index).await?))
}

pub async fn next_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = live_session(&state, id).await?;
    Ok(Json(handle.next().await?))
}

pub async fn previous_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = live_session(&state, id).await?;
    Ok(Json(handle.previous().await?))
}

/// Submits the session, or retries a submission that failed.
///
/// A submission already being written answers 202. Once the result is
/// stored the session is closed and later calls answer 404.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let handle = live_session(&state, id).await?;

    let response = match handle.submit().await? {
        SubmitOutcome::Submitted(result) | SubmitOutcome::AlreadySubmitted(result) => {
            state.sessions.remove(id).await;
            tracing::info!("Session {} closed after submission", id);
            Json(result).into_response()
        }
        SubmitOutcome::InProgress => (
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Submission in progress" })),
        )
            .into_response(),
    };

    Ok(response)
}

/// Leaves the quiz: cancels the countdown and discards the session.
pub async fn discard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    tracing::info!("Session {} discarded", id);
    Ok(StatusCode::NO_CONTENT)
}
