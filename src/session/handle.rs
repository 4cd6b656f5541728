// src/session/handle.rs

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    SessionError,
    machine::{QuizSession, SessionView, SubmitStep, TickOutcome},
};
use crate::{
    cache::{self, SessionCache, keys},
    models::{
        participant::{ParticipantStatus, TeamIdentity},
        quiz::Quiz,
        quiz_result::QuizResult,
    },
    store::QuizStore,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// This call persisted the result.
    Submitted(QuizResult),
    /// An earlier call already persisted it.
    AlreadySubmitted(QuizResult),
    /// Another call is writing the result right now.
    InProgress,
}

/// A live session bound to its store and cache.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    session: Arc<Mutex<QuizSession>>,
    submitted: Arc<AtomicBool>,
    store: Arc<dyn QuizStore>,
    cache: Arc<dyn SessionCache>,
}

impl SessionHandle {
    /// Builds a session from the quiz and team found in `cache`.
    ///
    /// A missing team means an anonymous attempt. A missing or unreadable
    /// quiz is an [`SessionError::InvalidQuiz`].
    pub async fn load(
        id: Uuid,
        store: Arc<dyn QuizStore>,
        cache: Arc<dyn SessionCache>,
    ) -> Result<Self, SessionError> {
        let team = match cache::get_json::<TeamIdentity>(cache.as_ref(), keys::TEAM).await {
            Ok(Some(team)) => team,
            Ok(None) => TeamIdentity::anonymous(),
            Err(e) => {
                tracing::warn!("Session {}: unreadable team identity ({}), continuing anonymously", id, e);
                TeamIdentity::anonymous()
            }
        };

        let mut session = QuizSession::new(team);
        match cache::get_json::<Quiz>(cache.as_ref(), keys::CURRENT_QUIZ).await {
            Ok(Some(quiz)) => session.initialize(quiz)?,
            Ok(None) => return Err(session.fail("no quiz has been selected")),
            Err(e) => return Err(session.fail(format!("stored quiz is unreadable: {}", e))),
        }

        tracing::info!("Session {} ready", id);

        Ok(Self {
            id,
            session: Arc::new(Mutex::new(session)),
            submitted: Arc::new(AtomicBool::new(false)),
            store,
            cache,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True once the store has accepted this session's result.
    pub fn is_submitted(&self) -> bool {
        self.submitted.load(Ordering::Acquire)
    }

    pub async fn view(&self) -> SessionView {
        self.session.lock().await.view(self.id)
    }

    pub async fn select_answer(
        &self,
        question_index: usize,
        option_index: usize,
    ) -> Result<SessionView, SessionError> {
        let mut session = self.session.lock().await;
        session.select_answer(question_index, option_index)?;
        Ok(session.view(self.id))
    }

    pub async fn navigate(&self, index: usize) -> Result<SessionView, SessionError> {
        let mut session = self.session.lock().await;
        session.navigate(index)?;
        Ok(session.view(self.id))
    }

    pub async fn next(&self) -> Result<SessionView, SessionError> {
        let mut session = self.session.lock().await;
        session.next()?;
        Ok(session.view(self.id))
    }

    pub async fn previous(&self) -> Result<SessionView, SessionError> {
        let mut session = self.session.lock().await;
        session.previous()?;
        Ok(session.view(self.id))
    }

    /// Advances the clock by one second. Submission on expiry is up to the caller.
    pub async fn tick(&self) -> TickOutcome {
        self.session.lock().await.tick()
    }

    /// Submits the attempt.
    ///
    /// Phase one appends an unsynced recovery record to the cache, phase two
    /// writes the result to the store and marks the record synced. The store
    /// is the system of record: only its answer decides success. Racing
    /// calls collapse into a single write.
    pub async fn submit(&self) -> Result<SubmitOutcome, SessionError> {
        let step = self.session.lock().await.begin_submit(Utc::now())?;

        let (submission_id, result, first_attempt) = match step {
            SubmitStep::InFlight => return Ok(SubmitOutcome::InProgress),
            SubmitStep::Completed(saved) => return Ok(SubmitOutcome::AlreadySubmitted(saved)),
            SubmitStep::Write {
                submission_id,
                result,
                first_attempt,
            } => (submission_id, result, first_attempt),
        };

        if first_attempt {
            if let Err(e) = cache::append_recovery(self.cache.as_ref(), submission_id, &result).await
            {
                tracing::warn!("Session {}: failed to write recovery record: {}", self.id, e);
            }
        }

        let outcome = self.store.create_quiz_result(result).await;
        if let Err(e) = &outcome {
            tracing::error!("Session {}: result write failed: {}", self.id, e);
        }

        let saved = self
            .session
            .lock()
            .await
            .complete_submit(submission_id, outcome)?;
        self.submitted.store(true, Ordering::Release);

        if let Err(e) = cache::mark_synced(self.cache.as_ref(), submission_id).await {
            tracing::warn!("Session {}: failed to mark recovery record synced: {}", self.id, e);
        }

        if let Some(participant_id) = saved.participant_id {
            if let Err(e) = self
                .store
                .update_participant_status(participant_id, ParticipantStatus::Completed)
                .await
            {
                tracing::warn!(
                    "Session {}: could not mark participant {} completed: {}",
                    self.id,
                    participant_id,
                    e
                );
            }
        }

        tracing::info!(
            "Session {} submitted: {}/{} correct for '{}'",
            self.id,
            saved.correct,
            saved.total,
            saved.team
        );

        Ok(SubmitOutcome::Submitted(saved))
    }
}
