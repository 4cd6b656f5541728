// src/store/mod.rs

//! Persistence seam for quizzes, participants, results and feedback.
//!
//! Handlers, sessions and the authoring wizard only ever talk to
//! [`QuizStore`]; the Postgres and in-memory backends are interchangeable.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    feedback::{Feedback, NewFeedback},
    participant::{NewParticipant, Participant, ParticipantStatus},
    quiz::{NewQuiz, Quiz, QuizPatch},
    quiz_result::{NewQuizResult, QuizResult},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Failure reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Network, driver or data fault.
    #[error("store failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(ref db)
                if db.code().as_deref() == Some("23505") =>
            {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// All quizzes, newest first.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError>;

    /// Case-insensitive code lookup. A miss is `Ok(None)`, not an error.
    async fn get_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError>;

    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError>;

    async fn update_quiz(&self, id: i64, patch: QuizPatch) -> Result<Quiz, StoreError>;

    async fn delete_quiz(&self, id: i64) -> Result<(), StoreError>;

    /// All participants, most recently joined first.
    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError>;

    async fn get_participant(&self, id: i64) -> Result<Option<Participant>, StoreError>;

    async fn create_participant(
        &self,
        participant: NewParticipant,
    ) -> Result<Participant, StoreError>;

    async fn update_participant_status(
        &self,
        id: i64,
        status: ParticipantStatus,
    ) -> Result<Participant, StoreError>;

    async fn delete_participant(&self, id: i64) -> Result<(), StoreError>;

    /// Results ordered by score descending, optionally restricted to one quiz.
    async fn list_quiz_results(&self, quiz_id: Option<i64>)
    -> Result<Vec<QuizResult>, StoreError>;

    async fn create_quiz_result(&self, result: NewQuizResult) -> Result<QuizResult, StoreError>;

    /// All feedback, newest first.
    async fn list_feedback(&self) -> Result<Vec<Feedback>, StoreError>;

    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError>;
}
