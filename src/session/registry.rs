// src/session/registry.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::RwLock,
    task::JoinHandle,
    time::{Instant, interval_at},
};
use uuid::Uuid;

use super::{countdown::Countdown, handle::SessionHandle};

struct LiveSession {
    handle: SessionHandle,
    countdown: Countdown,
}

/// Sessions hosted by this process, keyed by session id.
///
/// Owns each session's countdown: removing a session cancels its timer.
/// Sessions whose result reached the store are closed and pruned.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, LiveSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: SessionHandle, countdown: Countdown) {
        let id = handle.id();
        let mut sessions = self.sessions.write().await;
        Self::prune(&mut sessions);
        let previous = sessions.insert(id, LiveSession { handle, countdown });
        if previous.is_some() {
            tracing::warn!("Session {} replaced an existing session", id);
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|live| live.handle.clone())
    }

    /// Discards a session and cancels its countdown.
    pub async fn remove(&self, id: Uuid) -> Option<SessionHandle> {
        let mut live = self.sessions.write().await.remove(&id)?;
        live.countdown.cancel();
        Some(live.handle)
    }

    /// Drops every session that has been submitted. Returns how many went.
    pub async fn prune_submitted(&self) -> usize {
        Self::prune(&mut *self.sessions.write().await)
    }

    /// Prunes submitted sessions every `period` until the task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let pruned = self.prune_submitted().await;
                if pruned > 0 {
                    tracing::debug!("Pruned {} submitted sessions", pruned);
                }
            }
        })
    }

    fn prune(sessions: &mut HashMap<Uuid, LiveSession>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, live| !live.handle.is_submitted());
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
