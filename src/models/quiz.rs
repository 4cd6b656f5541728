// src/models/quiz.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Every question offers exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Lifecycle of a quiz: authored as a draft, opened to participants, then closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuizStatus {
    #[default]
    Draft,
    Active,
    Completed,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::Draft => "Draft",
            QuizStatus::Active => "Active",
            QuizStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for QuizStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(QuizStatus::Draft),
            "Active" => Ok(QuizStatus::Active),
            "Completed" => Ok(QuizStatus::Completed),
            other => Err(format!("Unknown quiz status '{}'", other)),
        }
    }
}

/// A multiple-choice question owned by its quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The prompt shown to participants.
    pub prompt: String,

    /// Fixed, ordered option texts.
    pub options: [String; OPTIONS_PER_QUESTION],

    /// Index into `options` of the correct answer.
    pub correct_option: usize,
}

/// Represents the 'quizzes' table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub questions: Vec<Question>,
    pub duration_minutes: i32,

    /// Short human-typed lookup key, matched case-insensitively.
    pub code: String,
    pub status: QuizStatus,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Countdown length for a session, never negative.
    pub fn time_limit_seconds(&self) -> u32 {
        u32::try_from(self.duration_minutes)
            .unwrap_or(0)
            .saturating_mul(60)
    }
}

/// A quiz about to be inserted; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub questions: Vec<Question>,
    pub duration_minutes: i32,
    pub code: String,
    pub status: QuizStatus,
}

/// Partial update of a quiz. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct QuizPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<i32>,
    pub status: Option<QuizStatus>,
    pub questions: Option<Vec<Question>>,
}

impl QuizPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.duration_minutes.is_none()
            && self.status.is_none()
            && self.questions.is_none()
    }
}

/// Question as sent to participants (excludes the correct option).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub prompt: String,
    pub options: [String; OPTIONS_PER_QUESTION],
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            prompt: q.prompt.clone(),
            options: q.options.clone(),
        }
    }
}

/// Quiz as returned by the code lookup.
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub duration_minutes: i32,
    pub question_count: usize,
    pub status: QuizStatus,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            code: quiz.code.clone(),
            duration_minutes: quiz.duration_minutes,
            question_count: quiz.question_count(),
            status: quiz.status,
        }
    }
}

/// One question as typed into the authoring form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuestionDraft {
    #[validate(custom(function = not_blank), length(max = 2000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: [String; OPTIONS_PER_QUESTION],
    #[serde(default)]
    pub correct_option: usize,
}

impl From<QuestionDraft> for Question {
    fn from(draft: QuestionDraft) -> Self {
        Self {
            prompt: draft.prompt,
            options: draft.options,
            correct_option: draft.correct_option,
        }
    }
}

impl From<&Question> for QuestionDraft {
    fn from(q: &Question) -> Self {
        Self {
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            correct_option: q.correct_option,
        }
    }
}

/// DTO for creating a quiz in one request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub time_limit_minutes: i64,
    pub questions: Vec<QuestionDraft>,
}

pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("must_not_be_blank"));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
