// src/session/mod.rs

//! Participant quiz sessions.
//!
//! [`machine::QuizSession`] holds the pure state machine. [`handle::SessionHandle`]
//! wraps it with the store and cache collaborators and performs the
//! two-phase submission. [`countdown::Countdown`] drives the one-second tick
//! from an injectable [`countdown::TickSource`], and
//! [`registry::SessionRegistry`] keeps the live sessions of this process.

pub mod countdown;
pub mod handle;
pub mod machine;
pub mod registry;

use thiserror::Error;

use crate::{cache::CacheError, store::StoreError};

pub use countdown::{Countdown, CountdownEnd, IntervalTicks, ManualTicks, TickSource};
pub use handle::{SessionHandle, SubmitOutcome};
pub use machine::{QuizSession, SessionState, SessionView, TickOutcome};
pub use registry::SessionRegistry;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The quiz cannot be taken (no questions, missing or unreadable).
    #[error("invalid quiz: {0}")]
    InvalidQuiz(String),

    #[error("{0}")]
    Validation(String),

    #[error("question {index} is out of range for a quiz of {len} questions")]
    OutOfRange { index: usize, len: usize },

    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The clock ran out; the attempt takes no more input.
    #[error("time is up, the quiz no longer accepts {0}")]
    TimeUp(&'static str),

    /// The result was computed but the store rejected the write.
    /// The result stays pending and can be re-sent.
    #[error("failed to submit result: {0}")]
    SubmissionFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
