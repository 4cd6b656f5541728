// src/store/memory.rs

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{QuizStore, StoreError};
use crate::models::{
    feedback::{Feedback, NewFeedback},
    participant::{NewParticipant, Participant, ParticipantStatus},
    quiz::{NewQuiz, Question, Quiz, QuizPatch, QuizStatus},
    quiz_result::{NewQuizResult, QuizResult},
};

/// Code of the quiz available when the service runs without a database.
pub const OFFLINE_QUIZ_CODE: &str = "COD138";

#[derive(Default)]
struct Tables {
    quizzes: Vec<Quiz>,
    participants: Vec<Participant>,
    results: Vec<QuizResult>,
    feedback: Vec<Feedback>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn code_taken(&self, code: &str) -> bool {
        self.quizzes.iter().any(|q| q.code.eq_ignore_ascii_case(code))
    }
}

/// Process-local store used for offline mode and tests.
///
/// Mirrors the Postgres backend's ordering and uniqueness rules so callers
/// observe the same behaviour from either.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the single offline quiz.
    pub fn with_offline_quiz() -> Self {
        let store = Self::new();
        if let Ok(mut tables) = store.tables.lock() {
            let id = tables.next_id();
            tables.quizzes.push(Quiz {
                id,
                title: "Code Clash (Offline)".to_string(),
                questions: vec![Question {
                    prompt: "Question 1".to_string(),
                    options: ["Option A", "Option B", "Option C", "Option D"]
                        .map(str::to_string),
                    correct_option: 0,
                }],
                duration_minutes: 30,
                code: OFFLINE_QUIZ_CODE.to_string(),
                status: QuizStatus::Active,
                created_at: Utc::now(),
            });
        }
        store
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StoreError> {
        let tables = self.tables()?;
        let mut quizzes = tables.quizzes.clone();
        quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(quizzes)
    }

    async fn get_quiz_by_code(&self, code: &str) -> Result<Option<Quiz>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .quizzes
            .iter()
            .find(|q| q.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, StoreError> {
        let mut tables = self.tables()?;
        if tables.code_taken(&quiz.code) {
            return Err(StoreError::Conflict(format!(
                "Quiz code '{}' already exists",
                quiz.code
            )));
        }

        let created = Quiz {
            id: tables.next_id(),
            title: quiz.title,
            questions: quiz.questions,
            duration_minutes: quiz.duration_minutes,
            code: quiz.code,
            status: quiz.status,
            created_at: Utc::now(),
        };
        tables.quizzes.push(created.clone());
        Ok(created)
    }

    async fn update_quiz(&self, id: i64, patch: QuizPatch) -> Result<Quiz, StoreError> {
        let mut tables = self.tables()?;
        let quiz = tables
            .quizzes
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| StoreError::NotFound("Quiz not found".to_string()))?;

        if let Some(title) = patch.title {
            quiz.title = title;
        }
        if let Some(duration) = patch.duration_minutes {
            quiz.duration_minutes = duration;
        }
        if let Some(status) = patch.status {
            quiz.status = status;
        }
        if let Some(questions) = patch.questions {
            quiz.questions = questions;
        }

        Ok(quiz.clone())
    }

    async fn delete_quiz(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let before = tables.quizzes.len();
        tables.quizzes.retain(|q| q.id != id);
        if tables.quizzes.len() == before {
            return Err(StoreError::NotFound("Quiz not found".to_string()));
        }
        Ok(())
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let tables = self.tables()?;
        let mut participants = tables.participants.clone();
        participants.sort_by(|a, b| b.joined_at.cmp(&a.joined_at).then(b.id.cmp(&a.id)));
        Ok(participants)
    }

    async fn get_participant(&self, id: i64) -> Result<Option<Participant>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.participants.iter().find(|p| p.id == id).cloned())
    }

    async fn create_participant(
        &self,
        participant: NewParticipant,
    ) -> Result<Participant, StoreError> {
        let mut tables = self.tables()?;
        let created = Participant {
            id: tables.next_id(),
            team: participant.team,
            college: participant.college,
            members: participant.members,
            status: ParticipantStatus::Active,
            email: participant.email,
            joined_at: Utc::now(),
        };
        tables.participants.push(created.clone());
        Ok(created)
    }

    async fn update_participant_status(
        &self,
        id: i64,
        status: ParticipantStatus,
    ) -> Result<Participant, StoreError> {
        let mut tables = self.tables()?;
        let participant = tables
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound("Participant not found".to_string()))?;
        participant.status = status;
        Ok(participant.clone())
    }

    async fn delete_participant(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let before = tables.participants.len();
        tables.participants.retain(|p| p.id != id);
        if tables.participants.len() == before {
            return Err(StoreError::NotFound("Participant not found".to_string()));
        }
        for result in tables.results.iter_mut().filter(|r| r.participant_id == Some(id)) {
            result.participant_id = None;
        }
        Ok(())
    }

    async fn list_quiz_results(
        &self,
        quiz_id: Option<i64>,
    ) -> Result<Vec<QuizResult>, StoreError> {
        let tables = self.tables()?;
        let mut results: Vec<QuizResult> = tables
            .results
            .iter()
            .filter(|r| quiz_id.is_none_or(|id| r.quiz_id == id))
            .cloned()
            .collect();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.submitted_at.cmp(&b.submitted_at))
        });
        Ok(results)
    }

    async fn create_quiz_result(&self, result: NewQuizResult) -> Result<QuizResult, StoreError> {
        let mut tables = self.tables()?;
        let created = QuizResult {
            id: tables.next_id(),
            quiz_id: result.quiz_id,
            participant_id: result.participant_id,
            rank: 0,
            team: result.team,
            college: result.college,
            score: result.score,
            correct: result.correct,
            total: result.total,
            time_taken: result.time_taken,
            submitted_at: result.submitted_at,
        };
        tables.results.push(created.clone());
        Ok(created)
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StoreError> {
        let tables = self.tables()?;
        let mut feedback = tables.feedback.clone();
        feedback.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(feedback)
    }

    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError> {
        let mut tables = self.tables()?;
        let created = Feedback {
            id: tables.next_id(),
            team: feedback.team,
            rating: feedback.rating,
            comment: feedback.comment,
            helpful: 0,
            created_at: Utc::now(),
        };
        tables.feedback.push(created.clone());
        Ok(created)
    }
}
