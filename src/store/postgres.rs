// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, prelude::FromRow, types::Json};

use super::{QuizStore, StoreError};
use crate::models::{
    feedback::{Feedback, NewFeedback},
    participant::{MembersRecord, NewParticipant, Participant, ParticipantStatus},
    quiz::{NewQuiz, Question, Quiz, QuizPatch},
    quiz_result::{NewQuizResult, QuizResult},
};

const QUIZ_COLUMNS: &str =
    "id, title, questions_data, duration_minutes, code, status, created_at";
const PARTICIPANT_COLUMNS: &str = "id, team, college, members, status, email, joined_at";
const RESULT_COLUMNS: &str = "id, quiz_id, participant_id, rank, team, college, score, correct, \
                              total, time_taken, submitted_at";

/// Row of the 'quizzes' table before status parsing.
#[derive(FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    questions_data: Json<Vec<Question>>,
    duration_minutes: i32,
    code: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuizRow> for Quiz {
    type Error = StoreError;

    fn try_from(row: QuizRow) -> Result<Self, Self::Error> {
        Ok(Quiz {
            id: row.id,
            title: row.title,
            questions: row.questions_data.0,
            duration_minutes: row.duration_minutes,
            code: row.code,
            status: row.status.parse().map_err(StoreError::Backend)?,
            created_at: row.created_at,
        })
    }
}

/// Row of the 'participants' table. `members` may hold a legacy count.
#[derive(FromRow)]
struct ParticipantRow {
    id: i64,
    team: String,
    college: String,
    members: Json<MembersRecord>,
    status: String,
    email: Option<String>,
    joined_at: DateTime<Utc>,
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = StoreError;

    fn try_from(row: ParticipantRow) -> Result<Self, Self::Error> {
        Ok(Participant {
            id: row.id,
            team: row.team,
            college: row.college,
            members: row.members.0.into_names(),
            status: row.status.parse().map_err(StoreError::Backend)?,
            email: row.email,
            joined_at: row.joined_at,
        })
    }
}

#[derive(FromRow)]
struct ResultRow {
    id: i64,
    quiz_id: i64,
    participant_id: Option<i64>,
    rank: i32,
    team: String,
    college: String,
    score: f64,
    correct: i32,
    total: i32,
    time_taken: String,
    submitted_at: DateTime<Utc>,
}

impl From<ResultRow> for QuizResult {
    fn from(row: ResultRow) -> Self {
        QuizResult {
            id: row.id,
            quiz_id: row.quiz_id,
            participant_id: row.participant_id,
            rank: row.rank,
            team: row.team,
            college: row.college,
            score: row.score,
            correct: row.correct,
            total: row.total,
            time_taken: row.time_taken,
            submitted_at: row.submitted_at,
        }
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_quiz(&self, id: i64) -> Result<Option<Quiz>, StoreError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes WHERE id = $1",
            QUIZ_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Quiz::try_from).transpose()
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        let rows = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes ORDER BY created_at DESC, id DESC",
            QUIZ_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            StoreError::from(e)
        })?;

        rows.into_iter().map(Quiz::try_from).collect()
    }

    async fn get_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            "SELECT {} FROM quizzes WHERE UPPER(code) = UPPER($1)",
            QUIZ_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up quiz code: {:?}", e);
            StoreError::from(e)
        })?;

        row.map(Quiz::try_from).transpose()
    }

    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError> {
        let row = sqlx::query_as::<_, QuizRow>(&format!(
            r#"
            INSERT INTO quizzes (title, questions_data, duration_minutes, code, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            QUIZ_COLUMNS
        ))
        .bind(&quiz.title)
        .bind(Json(&quiz.questions))
        .bind(quiz.duration_minutes)
        .bind(&quiz.code)
        .bind(quiz.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = StoreError::from(e);
            if !matches!(err, StoreError::Conflict(_)) {
                tracing::error!("Failed to create quiz: {}", err);
            }
            err
        })?;

        Quiz::try_from(row)
    }

    async fn update_quiz(&self, id: i64, patch: QuizPatch) -> Result<Quiz, StoreError> {
        if patch.is_empty() {
            return self
                .fetch_quiz(id)
                .await?
                .ok_or_else(|| StoreError::NotFound("Quiz not found".to_string()));
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = patch.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }

        if let Some(duration) = patch.duration_minutes {
            separated.push("duration_minutes = ");
            separated.push_bind_unseparated(duration);
        }

        if let Some(status) = patch.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }

        if let Some(questions) = patch.questions {
            separated.push("questions_data = ");
            separated.push_bind_unseparated(Json(questions));
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(QUIZ_COLUMNS);

        let row = builder
            .build_query_as::<QuizRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update quiz: {:?}", e);
                StoreError::from(e)
            })?
            .ok_or_else(|| StoreError::NotFound("Quiz not found".to_string()))?;

        Quiz::try_from(row)
    }

    async fn delete_quiz(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete quiz: {:?}", e);
                StoreError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Quiz not found".to_string()));
        }

        Ok(())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {} FROM participants ORDER BY joined_at DESC, id DESC",
            PARTICIPANT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list participants: {:?}", e);
            StoreError::from(e)
        })?;

        rows.into_iter().map(Participant::try_from).collect()
    }

    async fn get_participant(&self, id: i64) -> Result<Option<Participant>, StoreError> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {} FROM participants WHERE id = $1",
            PARTICIPANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Participant::try_from).transpose()
    }

    async fn create_participant(
        &self,
        participant: NewParticipant,
    ) -> Result<Participant, StoreError> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            r#"
            INSERT INTO participants (team, college, members, status, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PARTICIPANT_COLUMNS
        ))
        .bind(&participant.team)
        .bind(&participant.college)
        .bind(Json(MembersRecord::Names(participant.members)))
        .bind(ParticipantStatus::Active.as_str())
        .bind(&participant.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to register participant: {:?}", e);
            StoreError::from(e)
        })?;

        Participant::try_from(row)
    }

    async fn update_participant_status(
        &self,
        id: i64,
        status: ParticipantStatus,
    ) -> Result<Participant, StoreError> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "UPDATE participants SET status = $1 WHERE id = $2 RETURNING {}",
            PARTICIPANT_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Participant not found".to_string()))?;

        Participant::try_from(row)
    }

    async fn delete_participant(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete participant: {:?}", e);
                StoreError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Participant not found".to_string()));
        }

        Ok(())
    }

    async fn list_quiz_results(
        &self,
        quiz_id: Option<i64>,
    ) -> Result<Vec<QuizResult>, StoreError> {
        let rows = sqlx::query_as::<_, ResultRow>(&format!(
            r#"
            SELECT {}
            FROM quiz_results
            WHERE ($1::BIGINT IS NULL OR quiz_id = $1)
            ORDER BY score DESC, submitted_at ASC
            "#,
            RESULT_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quiz results: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(rows.into_iter().map(QuizResult::from).collect())
    }

    async fn create_quiz_result(&self, result: NewQuizResult) -> Result<QuizResult, StoreError> {
        let row = sqlx::query_as::<_, ResultRow>(&format!(
            r#"
            INSERT INTO quiz_results
            (quiz_id, participant_id, rank, team, college, score, correct, total, time_taken, submitted_at)
            VALUES ($1, $2, 0, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            RESULT_COLUMNS
        ))
        .bind(result.quiz_id)
        .bind(result.participant_id)
        .bind(&result.team)
        .bind(&result.college)
        .bind(result.score)
        .bind(result.correct)
        .bind(result.total)
        .bind(&result.time_taken)
        .bind(result.submitted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store quiz result: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(row.into())
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StoreError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, team, rating, comment, helpful, created_at
            FROM feedback
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list feedback: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(feedback)
    }

    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError> {
        let created = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (team, rating, comment)
            VALUES ($1, $2, $3)
            RETURNING id, team, rating, comment, helpful, created_at
            "#,
        )
        .bind(&feedback.team)
        .bind(feedback.rating)
        .bind(&feedback.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store feedback: {:?}", e);
            StoreError::from(e)
        })?;

        Ok(created)
    }
}
