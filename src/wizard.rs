// src/wizard.rs

//! Step-by-step quiz authoring.
//!
//! `CollectingMetadata → CollectingQuestions → Persisted`. The draft is saved
//! to the injected cache after every accepted step so an interrupted author
//! can resume; it is cleared once the quiz is stored.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::{
    cache::{self, CacheError, SessionCache, keys},
    models::quiz::{NewQuiz, OPTIONS_PER_QUESTION, QuestionDraft, Quiz, QuizStatus},
    store::{QuizStore, StoreError},
};

pub const MAX_QUESTIONS: i64 = 100;
pub const MAX_TIME_LIMIT_MINUTES: i64 = 600;

/// Codes tried after the first one collides.
const MAX_CODE_ATTEMPTS: usize = 10;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot {0} at this step")]
    InvalidState(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WizardStage {
    #[default]
    CollectingMetadata,
    CollectingQuestions,
    Persisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizMetadata {
    pub title: String,
    pub question_count: usize,
    pub time_limit_minutes: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardDraft {
    pub stage: WizardStage,
    pub metadata: Option<QuizMetadata>,
    pub questions: Vec<QuestionDraft>,
    pub cursor: usize,
    /// What the question form currently shows.
    pub form: QuestionDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardProgress {
    /// The question was saved; the form now edits `cursor`.
    NextQuestion { cursor: usize },
    /// The last question was saved and the quiz stored.
    Persisted(Quiz),
}

/// `"Python Basics"` with ordinal 5 gives `"PYT005"`.
pub fn generate_code(title: &str, ordinal: usize) -> String {
    let mut prefix: String = title.chars().take(3).collect::<String>().to_uppercase();
    while prefix.chars().count() < 3 {
        prefix.push('X');
    }
    format!("{}{:03}", prefix, ordinal)
}

pub struct QuizWizard {
    store: Arc<dyn QuizStore>,
    cache: Arc<dyn SessionCache>,
    draft: WizardDraft,
}

impl QuizWizard {
    pub fn new(store: Arc<dyn QuizStore>, cache: Arc<dyn SessionCache>) -> Self {
        Self {
            store,
            cache,
            draft: WizardDraft::default(),
        }
    }

    /// Picks up the draft left in the cache, or starts fresh.
    pub async fn resume(
        store: Arc<dyn QuizStore>,
        cache: Arc<dyn SessionCache>,
    ) -> Result<Self, WizardError> {
        let draft = match cache::get_json::<WizardDraft>(cache.as_ref(), keys::QUIZ_DRAFT).await {
            Ok(draft) => draft.unwrap_or_default(),
            Err(CacheError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable quiz draft: {}", e);
                WizardDraft::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            store,
            cache,
            draft,
        })
    }

    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    pub fn stage(&self) -> WizardStage {
        self.draft.stage
    }

    pub async fn set_metadata(
        &mut self,
        title: &str,
        question_count: i64,
        time_limit_minutes: i64,
    ) -> Result<(), WizardError> {
        self.require(WizardStage::CollectingMetadata, "set quiz details")?;

        let title = title.trim();
        if title.is_empty() {
            return Err(WizardError::Validation("Quiz title is required".to_string()));
        }
        if !(1..=MAX_QUESTIONS).contains(&question_count) {
            return Err(WizardError::Validation(format!(
                "Number of questions must be between 1 and {}",
                MAX_QUESTIONS
            )));
        }
        if !(1..=MAX_TIME_LIMIT_MINUTES).contains(&time_limit_minutes) {
            return Err(WizardError::Validation(format!(
                "Time limit must be between 1 and {} minutes",
                MAX_TIME_LIMIT_MINUTES
            )));
        }

        self.draft = WizardDraft {
            stage: WizardStage::CollectingQuestions,
            metadata: Some(QuizMetadata {
                title: title.to_string(),
                question_count: question_count as usize,
                time_limit_minutes: time_limit_minutes as i32,
            }),
            questions: Vec::new(),
            cursor: 0,
            form: QuestionDraft::default(),
        };
        self.save_draft().await
    }

    /// Stores `question` at the cursor. Saving the last question persists the quiz.
    pub async fn save_current_question(
        &mut self,
        question: QuestionDraft,
    ) -> Result<WizardProgress, WizardError> {
        self.require(WizardStage::CollectingQuestions, "save a question")?;

        question.validate().map_err(|_| {
            WizardError::Validation("Please fill all question and option fields".to_string())
        })?;
        if question.correct_option >= OPTIONS_PER_QUESTION {
            return Err(WizardError::Validation(format!(
                "Correct answer must be between 0 and {}",
                OPTIONS_PER_QUESTION - 1
            )));
        }

        let question = QuestionDraft {
            prompt: question.prompt.trim().to_string(),
            options: question.options.map(|o| o.trim().to_string()),
            correct_option: question.correct_option,
        };

        let cursor = self.draft.cursor;
        if cursor < self.draft.questions.len() {
            self.draft.questions[cursor] = question;
        } else {
            self.draft.questions.push(question);
        }

        if cursor + 1 >= self.question_count() {
            return self.finalize().await.map(WizardProgress::Persisted);
        }

        self.draft.cursor += 1;
        self.draft.form = QuestionDraft::default();
        self.save_draft().await?;
        Ok(WizardProgress::NextQuestion {
            cursor: self.draft.cursor,
        })
    }

    /// Steps back and loads the question saved there into the form.
    pub async fn previous_question(&mut self) -> Result<&QuestionDraft, WizardError> {
        self.require(WizardStage::CollectingQuestions, "go back")?;
        if self.draft.cursor == 0 {
            return Err(WizardError::InvalidState("go back from the first question"));
        }

        self.draft.cursor -= 1;
        if let Some(saved) = self.draft.questions.get(self.draft.cursor) {
            self.draft.form = saved.clone();
        }
        self.save_draft().await?;
        Ok(&self.draft.form)
    }

    /// Drops the draft without storing anything.
    pub async fn discard(&mut self) -> Result<(), WizardError> {
        self.draft = WizardDraft::default();
        self.cache.remove(keys::QUIZ_DRAFT).await?;
        Ok(())
    }

    async fn finalize(&mut self) -> Result<Quiz, WizardError> {
        let metadata = self
            .draft
            .metadata
            .clone()
            .ok_or(WizardError::InvalidState("finish a quiz without details"))?;

        let questions: Vec<_> = self.draft.questions.iter().cloned().map(Into::into).collect();
        let existing = self.store.list_quizzes().await?.len();

        let mut attempt = 0;
        let quiz = loop {
            let code = generate_code(&metadata.title, existing + 1 + attempt);
            let new_quiz = NewQuiz {
                title: metadata.title.clone(),
                questions: questions.clone(),
                duration_minutes: metadata.time_limit_minutes,
                code: code.clone(),
                status: QuizStatus::Draft,
            };

            match self.store.create_quiz(new_quiz).await {
                Ok(quiz) => break quiz,
                Err(StoreError::Conflict(_)) if attempt + 1 < MAX_CODE_ATTEMPTS => {
                    tracing::warn!("Quiz code {} already taken, trying the next one", code);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            "Quiz '{}' created with code {} ({} questions)",
            quiz.title,
            quiz.code,
            quiz.question_count()
        );

        self.draft = WizardDraft {
            stage: WizardStage::Persisted,
            ..WizardDraft::default()
        };
        if let Err(e) = self.cache.remove(keys::QUIZ_DRAFT).await {
            tracing::warn!("Failed to clear quiz draft: {}", e);
        }

        Ok(quiz)
    }

    fn question_count(&self) -> usize {
        self.draft
            .metadata
            .as_ref()
            .map(|m| m.question_count)
            .unwrap_or(0)
    }

    fn require(&self, stage: WizardStage, action: &'static str) -> Result<(), WizardError> {
        if self.draft.stage != stage {
            return Err(WizardError::InvalidState(action));
        }
        Ok(())
    }

    async fn save_draft(&self) -> Result<(), WizardError> {
        cache::set_json(self.cache.as_ref(), keys::QUIZ_DRAFT, &self.draft).await?;
        Ok(())
    }
}
