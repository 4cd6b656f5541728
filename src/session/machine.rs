// src/session/machine.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::SessionError;
use crate::{
    models::{
        participant::TeamIdentity,
        quiz::{OPTIONS_PER_QUESTION, PublicQuestion, Quiz},
        quiz_result::{NewQuizResult, QuizResult},
    },
    store::StoreError,
    utils::time::format_elapsed,
};

/// `Loading → Error | Ready → Submitting → Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Loading,
    Error,
    Ready,
    Submitting,
    Submitted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Loading => "loading",
            SessionState::Error => "in error",
            SessionState::Ready => "ready",
            SessionState::Submitting => "submitting",
            SessionState::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time left after the decrement.
    Running(u32),
    /// The clock hit zero on this tick; the caller must submit.
    Expired,
    /// The session is not running a countdown.
    Idle,
}

/// What the caller must do after [`QuizSession::begin_submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStep {
    /// Write `result` to the store, then report back with
    /// [`QuizSession::complete_submit`].
    Write {
        submission_id: Uuid,
        result: NewQuizResult,
        /// False when re-sending a result whose previous write failed.
        first_attempt: bool,
    },
    /// Another write for this session has not returned yet.
    InFlight,
    /// Already persisted.
    Completed(QuizResult),
}

#[derive(Debug, Clone)]
struct PendingSubmission {
    id: Uuid,
    result: NewQuizResult,
    in_flight: bool,
}

/// Snapshot of a session as shown to the participant.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: SessionState,
    pub quiz_id: Option<i64>,
    pub title: Option<String>,
    pub team: String,
    pub questions: Vec<PublicQuestion>,
    pub current_question: usize,
    pub answers: Vec<Option<usize>>,
    pub answered: usize,
    pub unanswered: usize,
    pub remaining_seconds: u32,
    pub result: Option<QuizResult>,
    /// Computed result kept after a failed write, awaiting a retry.
    pub pending_result: Option<NewQuizResult>,
    pub last_error: Option<String>,
}

/// One participant's attempt at a quiz.
///
/// Synchronous and free of I/O; every trigger is a method call.
#[derive(Debug, Clone)]
pub struct QuizSession {
    team: TeamIdentity,
    state: SessionState,
    quiz: Option<Quiz>,
    current: usize,
    answers: Vec<Option<usize>>,
    initial_seconds: u32,
    remaining_seconds: u32,
    pending: Option<PendingSubmission>,
    result: Option<QuizResult>,
    last_error: Option<String>,
}

impl QuizSession {
    pub fn new(team: TeamIdentity) -> Self {
        Self {
            team,
            state: SessionState::Loading,
            quiz: None,
            current: 0,
            answers: Vec::new(),
            initial_seconds: 0,
            remaining_seconds: 0,
            pending: None,
            result: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn current_question(&self) -> usize {
        self.current
    }

    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn initialize(&mut self, quiz: Quiz) -> Result<(), SessionError> {
        self.require(SessionState::Loading, "initialize")?;

        if quiz.questions.is_empty() {
            return Err(self.fail(format!("quiz '{}' has no questions", quiz.code)));
        }

        self.answers = vec![None; quiz.questions.len()];
        self.initial_seconds = quiz.time_limit_seconds();
        self.remaining_seconds = self.initial_seconds;
        self.current = 0;
        self.quiz = Some(quiz);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Moves a loading session to `Error` and returns the matching error.
    pub fn fail(&mut self, reason: impl Into<String>) -> SessionError {
        let reason = reason.into();
        if self.state == SessionState::Loading {
            self.state = SessionState::Error;
            self.last_error = Some(reason.clone());
        }
        SessionError::InvalidQuiz(reason)
    }

    pub fn select_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<(), SessionError> {
        self.require_running("answers")?;
        self.check_index(question_index)?;

        if option_index >= OPTIONS_PER_QUESTION {
            return Err(SessionError::Validation(format!(
                "option {} does not exist, choose between 0 and {}",
                option_index,
                OPTIONS_PER_QUESTION - 1
            )));
        }

        self.answers[question_index] = Some(option_index);
        Ok(())
    }

    pub fn navigate(&mut self, target: usize) -> Result<(), SessionError> {
        self.require_running("navigation")?;
        self.check_index(target)?;
        self.current = target;
        Ok(())
    }

    /// Moves forward one question; a no-op on the last one.
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.require_running("navigation")?;
        if self.current + 1 < self.answers.len() {
            self.current += 1;
        }
        Ok(())
    }

    /// Moves back one question; a no-op on the first one.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        self.require_running("navigation")?;
        self.current = self.current.saturating_sub(1);
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::Ready {
            return TickOutcome::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining_seconds)
        }
    }

    /// Starts (or resumes) submission.
    ///
    /// The result is computed exactly once, on the first call from `Ready`.
    /// Later calls either report the write in flight, hand the same result
    /// back for a retry, or return the persisted result.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Result<SubmitStep, SessionError> {
        match self.state {
            SessionState::Loading | SessionState::Error => Err(SessionError::InvalidState {
                operation: "submit",
                state: self.state,
            }),
            SessionState::Submitted => self
                .result
                .clone()
                .map(SubmitStep::Completed)
                .ok_or(SessionError::InvalidState {
                    operation: "submit",
                    state: self.state,
                }),
            SessionState::Submitting => match self.pending.as_mut() {
                Some(pending) if pending.in_flight => Ok(SubmitStep::InFlight),
                Some(pending) => {
                    pending.in_flight = true;
                    Ok(SubmitStep::Write {
                        submission_id: pending.id,
                        result: pending.result.clone(),
                        first_attempt: false,
                    })
                }
                None => Err(SessionError::InvalidState {
                    operation: "submit",
                    state: self.state,
                }),
            },
            SessionState::Ready => {
                let result = self.compute_result(now)?;
                let id = Uuid::new_v4();
                self.pending = Some(PendingSubmission {
                    id,
                    result: result.clone(),
                    in_flight: true,
                });
                self.state = SessionState::Submitting;
                Ok(SubmitStep::Write {
                    submission_id: id,
                    result,
                    first_attempt: true,
                })
            }
        }
    }

    /// Records the store's answer to a [`SubmitStep::Write`].
    pub fn complete_submit(
        &mut self,
        submission_id: Uuid,
        outcome: Result<QuizResult, StoreError>,
    ) -> Result<QuizResult, SessionError> {
        let pending = match self.pending.as_mut() {
            Some(p) if p.id == submission_id && self.state == SessionState::Submitting => p,
            _ => {
                return Err(SessionError::InvalidState {
                    operation: "complete submission",
                    state: self.state,
                });
            }
        };

        match outcome {
            Ok(result) => {
                self.pending = None;
                self.last_error = None;
                self.result = Some(result.clone());
                self.state = SessionState::Submitted;
                Ok(result)
            }
            Err(e) => {
                pending.in_flight = false;
                let message = e.to_string();
                self.last_error = Some(message.clone());
                Err(SessionError::SubmissionFailed(message))
            }
        }
    }

    pub fn view(&self, session_id: Uuid) -> SessionView {
        let answered = self.answers.iter().filter(|a| a.is_some()).count();
        SessionView {
            session_id,
            state: self.state,
            quiz_id: self.quiz.as_ref().map(|q| q.id),
            title: self.quiz.as_ref().map(|q| q.title.clone()),
            team: self.team.team.clone(),
            questions: self
                .quiz
                .as_ref()
                .map(|q| q.questions.iter().map(PublicQuestion::from).collect())
                .unwrap_or_default(),
            current_question: self.current,
            answers: self.answers.clone(),
            answered,
            unanswered: self.answers.len() - answered,
            remaining_seconds: self.remaining_seconds,
            result: self.result.clone(),
            pending_result: self.pending.as_ref().map(|p| p.result.clone()),
            last_error: self.last_error.clone(),
        }
    }

    fn compute_result(&self, now: DateTime<Utc>) -> Result<NewQuizResult, SessionError> {
        let quiz = self.quiz.as_ref().ok_or(SessionError::InvalidState {
            operation: "submit",
            state: self.state,
        })?;

        let total = quiz.questions.len();
        let correct = quiz
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, answer)| **answer == Some(q.correct_option))
            .count();

        let elapsed = self.initial_seconds - self.remaining_seconds;

        Ok(NewQuizResult {
            quiz_id: quiz.id,
            participant_id: self.team.participant_id,
            team: self.team.team.clone(),
            college: self.team.college.clone(),
            score: correct as f64 / total as f64 * 100.0,
            correct: correct as i32,
            total: total as i32,
            time_taken: format_elapsed(elapsed),
            submitted_at: now,
        })
    }

    fn require(&self, expected: SessionState, operation: &'static str) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Participant input needs a `Ready` session with time left.
    fn require_running(&self, input: &'static str) -> Result<(), SessionError> {
        self.require(SessionState::Ready, "take input")?;
        if self.remaining_seconds == 0 {
            return Err(SessionError::TimeUp(input));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index >= self.answers.len() {
            return Err(SessionError::OutOfRange {
                index,
                len: self.answers.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::quiz::{Question, QuizStatus};

    pub(crate) fn quiz_with_answers(correct: &[usize], minutes: i32) -> Quiz {
        Quiz {
            id: 7,
            title: "Python Basics".to_string(),
            questions: correct
                .iter()
                .enumerate()
                .map(|(i, &c)| Question {
                    prompt: format!("Question {}", i + 1),
                    options: ["A", "B", "C", "D"].map(str::to_string),
                    correct_option: c,
                })
                .collect(),
            duration_minutes: minutes,
            code: "PYT001".to_string(),
            status: QuizStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn ready(correct: &[usize], minutes: i32) -> QuizSession {
        let mut session = QuizSession::new(TeamIdentity::anonymous());
        session.initialize(quiz_with_answers(correct, minutes)).unwrap();
        session
    }

    fn write_step(step: SubmitStep) -> (Uuid, NewQuizResult, bool) {
        match step {
            SubmitStep::Write {
                submission_id,
                result,
                first_attempt,
            } => (submission_id, result, first_attempt),
            other => panic!("expected a write step, got {:?}", other),
        }
    }

    fn stored(result: &NewQuizResult) -> QuizResult {
        QuizResult {
            id: 1,
            quiz_id: result.quiz_id,
            participant_id: result.participant_id,
            rank: 0,
            team: result.team.clone(),
            college: result.college.clone(),
            score: result.score,
            correct: result.correct,
            total: result.total,
            time_taken: result.time_taken.clone(),
            submitted_at: result.submitted_at,
        }
    }

    #[test]
    fn initialize_builds_blank_answers_and_clock() {
        let session = ready(&[0, 1, 2], 30);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.answers(), &[None, None, None]);
        assert_eq!(session.remaining_seconds(), 1800);
        assert_eq!(session.current_question(), 0);
    }

    #[test]
    fn empty_quiz_is_invalid_and_terminal() {
        let mut session = QuizSession::new(TeamIdentity::anonymous());
        let err = session.initialize(quiz_with_answers(&[], 10)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidQuiz(_)));
        assert_eq!(session.state(), SessionState::Error);

        assert!(matches!(
            session.initialize(quiz_with_answers(&[0], 10)),
            Err(SessionError::InvalidState { .. })
        ));
        assert!(session.begin_submit(Utc::now()).is_err());
    }

    #[test]
    fn selecting_again_overwrites_previous_answer() {
        let mut session = ready(&[0, 1], 10);
        session.select_answer(0, 2).unwrap();
        session.select_answer(0, 1).unwrap();
        session.select_answer(0, 1).unwrap();

        assert_eq!(session.answers(), &[Some(1), None]);
        assert_eq!(session.current_question(), 0);
    }

    #[test]
    fn answer_bounds_are_checked() {
        let mut session = ready(&[0, 1], 10);
        assert!(matches!(
            session.select_answer(0, 4),
            Err(SessionError::Validation(_))
        ));
        assert!(matches!(
            session.select_answer(2, 0),
            Err(SessionError::OutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn navigation_rejects_out_of_range_and_clamps_steps() {
        let mut session = ready(&[0, 1, 2], 10);
        session.navigate(2).unwrap();
        assert!(matches!(
            session.navigate(3),
            Err(SessionError::OutOfRange { .. })
        ));
        assert_eq!(session.current_question(), 2);

        session.next().unwrap();
        assert_eq!(session.current_question(), 2);

        session.navigate(0).unwrap();
        session.previous().unwrap();
        assert_eq!(session.current_question(), 0);
        session.next().unwrap();
        assert_eq!(session.current_question(), 1);
    }

    #[test]
    fn tick_expires_exactly_once_at_zero() {
        let mut session = ready(&[0], 1);
        for expected in (1..60).rev() {
            assert_eq!(session.tick(), TickOutcome::Running(expected));
        }
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.remaining_seconds(), 0);

        session.begin_submit(Utc::now()).unwrap();
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.remaining_seconds(), 0);
    }

    #[test]
    fn zero_minute_quiz_never_goes_negative() {
        let mut session = ready(&[0], 0);
        assert!(matches!(
            session.select_answer(0, 0),
            Err(SessionError::TimeUp(_))
        ));
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.remaining_seconds(), 0);
    }

    #[test]
    fn input_after_expiry_is_locked_out() {
        let mut session = ready(&[0, 1], 1);
        session.navigate(1).unwrap();
        for _ in 0..59 {
            session.tick();
        }
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.state(), SessionState::Ready);

        assert!(matches!(
            session.select_answer(0, 0),
            Err(SessionError::TimeUp(_))
        ));
        assert!(matches!(session.navigate(0), Err(SessionError::TimeUp(_))));
        assert!(matches!(session.previous(), Err(SessionError::TimeUp(_))));
        assert!(matches!(session.next(), Err(SessionError::TimeUp(_))));
        assert_eq!(session.answers(), &[None, None]);
        assert_eq!(session.current_question(), 1);

        let (_, result, _) = write_step(session.begin_submit(Utc::now()).unwrap());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.time_taken, "1:00");
    }

    #[test]
    fn half_right_scores_fifty() {
        let mut session = ready(&[0, 1], 30);
        session.select_answer(0, 0).unwrap();
        session.select_answer(1, 2).unwrap();

        let (_, result, first) = write_step(session.begin_submit(Utc::now()).unwrap());
        assert!(first);
        assert_eq!(result.correct, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.score, 50.0);
        assert_eq!(result.team, "Anonymous Team");
        assert_eq!(session.state(), SessionState::Submitting);
    }

    #[test]
    fn unanswered_questions_count_as_wrong() {
        let mut session = ready(&[0, 0, 0], 30);
        session.select_answer(1, 0).unwrap();

        let (_, result, _) = write_step(session.begin_submit(Utc::now()).unwrap());
        assert_eq!(result.correct, 1);
        assert_eq!(result.score, 1.0 / 3.0 * 100.0);
    }

    #[test]
    fn time_taken_is_elapsed_minutes_and_seconds() {
        let mut session = ready(&[0], 30);
        for _ in 0..734 {
            session.tick();
        }
        assert_eq!(session.remaining_seconds(), 1066);

        let (_, result, _) = write_step(session.begin_submit(Utc::now()).unwrap());
        assert_eq!(result.time_taken, "12:14");
    }

    #[test]
    fn second_submit_while_in_flight_does_nothing() {
        let mut session = ready(&[0], 30);
        let (id, result, _) = write_step(session.begin_submit(Utc::now()).unwrap());

        assert_eq!(session.begin_submit(Utc::now()).unwrap(), SubmitStep::InFlight);
        session.select_answer(0, 0).unwrap_err();

        let saved = session.complete_submit(id, Ok(stored(&result))).unwrap();
        assert_eq!(session.state(), SessionState::Submitted);
        assert_eq!(
            session.begin_submit(Utc::now()).unwrap(),
            SubmitStep::Completed(saved)
        );
    }

    #[test]
    fn failed_write_keeps_result_for_retry() {
        let mut session = ready(&[1], 30);
        session.select_answer(0, 1).unwrap();
        let (id, result, _) = write_step(session.begin_submit(Utc::now()).unwrap());

        let err = session
            .complete_submit(id, Err(StoreError::Backend("connection reset".to_string())))
            .unwrap_err();
        assert!(matches!(err, SessionError::SubmissionFailed(_)));
        assert_eq!(session.state(), SessionState::Submitting);

        let view = session.view(Uuid::nil());
        assert_eq!(view.pending_result.as_ref(), Some(&result));
        assert!(view.last_error.is_some());

        let (retry_id, retried, first) = write_step(session.begin_submit(Utc::now()).unwrap());
        assert_eq!(retry_id, id);
        assert_eq!(retried, result);
        assert!(!first);

        session.complete_submit(id, Ok(stored(&retried))).unwrap();
        let view = session.view(Uuid::nil());
        assert_eq!(view.state, SessionState::Submitted);
        assert!(view.pending_result.is_none());
        assert!(view.last_error.is_none());
    }

    #[test]
    fn stale_completion_is_rejected() {
        let mut session = ready(&[0], 30);
        let (_, result, _) = write_step(session.begin_submit(Utc::now()).unwrap());
        assert!(matches!(
            session.complete_submit(Uuid::new_v4(), Ok(stored(&result))),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn view_hides_correct_answers() {
        let mut session = ready(&[3, 2], 5);
        session.select_answer(1, 2).unwrap();

        let view = session.view(Uuid::nil());
        assert_eq!(view.answered, 1);
        assert_eq!(view.unanswered, 1);
        assert_eq!(view.questions.len(), 2);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("correct_option"));
    }
}
