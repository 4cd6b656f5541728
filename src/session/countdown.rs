// src/session/countdown.rs

use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, Interval, interval_at},
};

use super::{
    SessionError,
    handle::{SessionHandle, SubmitOutcome},
    machine::TickOutcome,
};

/// Source of the one-second countdown ticks.
#[async_trait]
pub trait TickSource: Send {
    /// Waits for the next tick. `false` means no more ticks will come.
    async fn next_tick(&mut self) -> bool;
}

/// Wall-clock ticks from a tokio interval.
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    /// First tick fires one `period` from now, not immediately.
    pub fn every(period: Duration) -> Self {
        Self {
            interval: interval_at(Instant::now() + period, period),
        }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks delivered by hand through a channel.
pub struct ManualTicks {
    rx: mpsc::UnboundedReceiver<()>,
}

impl ManualTicks {
    pub fn channel() -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }
}

#[async_trait]
impl TickSource for ManualTicks {
    async fn next_tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

#[derive(Debug)]
pub enum CountdownEnd {
    /// Time ran out and the session was submitted.
    Expired(SubmitOutcome),
    /// The session left `Ready` on its own (manual submit).
    Stopped,
    /// The tick source ran dry.
    SourceClosed,
    /// Time ran out but the submission failed; the session keeps the result.
    Failed(SessionError),
}

/// Background task ticking one session.
///
/// Cancelled on drop. Cancelling never interrupts a submission already
/// started by an expiry: that runs on its own task to completion.
pub struct Countdown {
    task: Option<JoinHandle<CountdownEnd>>,
}

impl Countdown {
    pub fn start<T>(handle: SessionHandle, mut ticks: T) -> Self
    where
        T: TickSource + 'static,
    {
        let task = tokio::spawn(async move {
            loop {
                if !ticks.next_tick().await {
                    return CountdownEnd::SourceClosed;
                }

                match handle.tick().await {
                    TickOutcome::Running(_) => continue,
                    TickOutcome::Idle => return CountdownEnd::Stopped,
                    TickOutcome::Expired => {
                        tracing::info!("Session {}: time is up, submitting", handle.id());
                        let submitter = handle.clone();
                        let submission = tokio::spawn(async move { submitter.submit().await });
                        return match submission.await {
                            Ok(Ok(outcome)) => CountdownEnd::Expired(outcome),
                            Ok(Err(e)) => {
                                tracing::warn!(
                                    "Session {}: automatic submission failed: {}",
                                    handle.id(),
                                    e
                                );
                                CountdownEnd::Failed(e)
                            }
                            Err(e) => CountdownEnd::Failed(SessionError::SubmissionFailed(
                                e.to_string(),
                            )),
                        };
                    }
                }
            }
        });

        Self { task: Some(task) }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Waits for the countdown to end. `None` if it was cancelled.
    pub async fn join(mut self) -> Option<CountdownEnd> {
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        session::{
            SessionState,
            handle::tests::{FlakyStore, seeded_cache},
            machine::tests::quiz_with_answers,
        },
        store::{MemoryStore, QuizStore},
    };

    async fn handle_for(minutes: i32, store: Arc<dyn QuizStore>) -> SessionHandle {
        let cache = seeded_cache(&quiz_with_answers(&[0, 1], minutes), None).await;
        SessionHandle::load(Uuid::new_v4(), store, cache).await.unwrap()
    }

    #[tokio::test]
    async fn expiry_submits_automatically() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle_for(1, store.clone()).await;
        let (tx, ticks) = ManualTicks::channel();
        let countdown = Countdown::start(handle.clone(), ticks);

        for _ in 0..60 {
            tx.send(()).unwrap();
        }

        match countdown.join().await {
            Some(CountdownEnd::Expired(SubmitOutcome::Submitted(result))) => {
                assert_eq!(result.time_taken, "1:00");
                assert_eq!(result.score, 0.0);
            }
            other => panic!("unexpected end {:?}", other),
        }
        assert_eq!(handle.view().await.state, SessionState::Submitted);
        assert_eq!(store.list_quiz_results(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn manual_submit_stops_the_countdown() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle_for(1, store.clone()).await;
        let (tx, ticks) = ManualTicks::channel();
        let countdown = Countdown::start(handle.clone(), ticks);

        tx.send(()).unwrap();
        handle.submit().await.unwrap();
        tx.send(()).unwrap();

        assert!(matches!(countdown.join().await, Some(CountdownEnd::Stopped)));
        assert_eq!(store.list_quiz_results(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_countdown_stops_ticking() {
        let handle = handle_for(1, Arc::new(MemoryStore::new())).await;
        let (tx, ticks) = ManualTicks::channel();
        let mut countdown = Countdown::start(handle.clone(), ticks);

        countdown.cancel();
        assert!(countdown.is_finished());
        let _ = tx.send(());
        tokio::task::yield_now().await;

        assert_eq!(handle.view().await.remaining_seconds, 60);
        assert!(countdown.join().await.is_none());
    }

    #[tokio::test]
    async fn closed_source_ends_quietly() {
        let handle = handle_for(1, Arc::new(MemoryStore::new())).await;
        let (tx, ticks) = ManualTicks::channel();
        let countdown = Countdown::start(handle.clone(), ticks);
        drop(tx);

        assert!(matches!(
            countdown.join().await,
            Some(CountdownEnd::SourceClosed)
        ));
        assert_eq!(handle.view().await.state, SessionState::Ready);
    }

    #[tokio::test]
    async fn failed_auto_submit_is_reported_and_result_kept() {
        let store = Arc::new(FlakyStore::new());
        store.fail_writes.store(true, std::sync::atomic::Ordering::SeqCst);
        let handle = handle_for(0, store.clone()).await;
        let (tx, ticks) = ManualTicks::channel();
        let countdown = Countdown::start(handle.clone(), ticks);
        tx.send(()).unwrap();

        assert!(matches!(
            countdown.join().await,
            Some(CountdownEnd::Failed(SessionError::SubmissionFailed(_)))
        ));
        let view = handle.view().await;
        assert_eq!(view.state, SessionState::Submitting);
        assert!(view.pending_result.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_run_out_the_clock() {
        let store = Arc::new(MemoryStore::new());
        let handle = handle_for(1, store.clone()).await;
        let started = Instant::now();

        let countdown = Countdown::start(handle.clone(), IntervalTicks::every(Duration::from_secs(1)));
        let end = countdown.join().await;

        assert!(matches!(end, Some(CountdownEnd::Expired(_))));
        assert_eq!(started.elapsed(), Duration::from_secs(60));
        assert_eq!(store.list_quiz_results(None).await.unwrap().len(), 1);
    }
}
