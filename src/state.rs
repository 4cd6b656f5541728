// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    cache::SessionCache,
    config::Config,
    error::AppError,
    session::SessionRegistry,
    store::QuizStore,
    utils::hash::AdminCredentials,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    /// Shared cache; each session and wizard works in its own scope of it.
    pub cache: Arc<dyn SessionCache>,
    pub sessions: Arc<SessionRegistry>,
    pub config: Config,
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    /// Hashes the configured admin password once, up front.
    pub fn new(
        store: Arc<dyn QuizStore>,
        cache: Arc<dyn SessionCache>,
        config: Config,
    ) -> Result<Self, AppError> {
        let admin = AdminCredentials::new(&config.admin_username, &config.admin_password)?;
        Ok(Self {
            store,
            cache,
            sessions: Arc::new(SessionRegistry::new()),
            config,
            admin: Arc::new(admin),
        })
    }
}

impl FromRef<AppState> for Arc<dyn QuizStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
