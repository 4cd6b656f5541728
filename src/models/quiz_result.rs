// src/models/quiz_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the 'quiz_results' table.
/// Written once per completed session and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: i64,
    pub quiz_id: i64,
    pub participant_id: Option<i64>,

    /// Stored as 0; leaderboards assign the displayed rank on read.
    pub rank: i32,

    pub team: String,
    pub college: String,

    /// Percentage in [0, 100].
    pub score: f64,
    pub correct: i32,
    pub total: i32,

    /// Elapsed time formatted as `m:ss`.
    pub time_taken: String,
    pub submitted_at: DateTime<Utc>,
}

/// A computed result waiting to be written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuizResult {
    pub quiz_id: i64,
    pub participant_id: Option<i64>,
    pub team: String,
    pub college: String,
    pub score: f64,
    pub correct: i32,
    pub total: i32,
    pub time_taken: String,
    pub submitted_at: DateTime<Utc>,
}

/// Query parameters for listing results.
#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    pub quiz_id: Option<i64>,
}
