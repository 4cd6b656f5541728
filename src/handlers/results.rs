// src/handlers/results.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::quiz_result::ResultsQuery,
    reports::{self, csv},
    store::QuizStore,
};

/// Leaderboard, optionally for one quiz, with ranks assigned.
/// Admin only.
pub async fn list_results(
    State(store): State<Arc<dyn QuizStore>>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let results = store.list_quiz_results(query.quiz_id).await?;
    Ok(Json(reports::rank_results(results)))
}

/// Admin only.
pub async fn result_stats(
    State(store): State<Arc<dyn QuizStore>>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let results = store.list_quiz_results(query.quiz_id).await?;
    Ok(Json(reports::summarize(&results)))
}

/// Downloads the leaderboard as CSV.
/// Admin only.
pub async fn export_results(
    State(store): State<Arc<dyn QuizStore>>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let results = store.list_quiz_results(query.quiz_id).await?;
    if results.is_empty() {
        return Err(AppError::NotFound("No results to export".to_string()));
    }

    let body = csv::results_csv(&reports::rank_results(results));
    let disposition = format!(
        "attachment; filename=\"{}\"",
        csv::export_filename(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
