// src/cache.rs

//! Key-value session cache.
//!
//! Carries the active quiz and team identity into a session and keeps the
//! append-only recovery log of submitted results. Values are JSON strings.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::models::quiz_result::NewQuizResult;

/// Well-known cache keys.
pub mod keys {
    /// Serialized quiz the session is about to take.
    pub const CURRENT_QUIZ: &str = "current_quiz";
    /// Serialized team identity.
    pub const TEAM: &str = "team";
    /// Append-only log of computed results.
    pub const QUIZ_RESULTS: &str = "quiz_results";
    /// In-progress authoring wizard state.
    pub const QUIZ_DRAFT: &str = "quiz_draft";
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// Reads and decodes a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn SessionCache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encodes and writes a JSON value.
pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn SessionCache,
    key: &str,
    value: &T,
) -> Result<(), CacheError> {
    cache.set(key, serde_json::to_string(value)?).await
}

/// Entry of the [`keys::QUIZ_RESULTS`] recovery log.
///
/// Written unsynced before the store write and flipped once the store has
/// accepted the result. An unsynced entry is a result the store may not have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub submission_id: Uuid,
    pub result: NewQuizResult,
    pub synced: bool,
}

pub async fn recovery_log(cache: &dyn SessionCache) -> Result<Vec<RecoveryRecord>, CacheError> {
    Ok(get_json(cache, keys::QUIZ_RESULTS).await?.unwrap_or_default())
}

/// Appends an unsynced record for `result`.
pub async fn append_recovery(
    cache: &dyn SessionCache,
    submission_id: Uuid,
    result: &NewQuizResult,
) -> Result<(), CacheError> {
    let mut log = recovery_log(cache).await?;
    log.push(RecoveryRecord {
        submission_id,
        result: result.clone(),
        synced: false,
    });
    set_json(cache, keys::QUIZ_RESULTS, &log).await
}

/// Flags the record of `submission_id` as persisted in the store.
pub async fn mark_synced(cache: &dyn SessionCache, submission_id: Uuid) -> Result<(), CacheError> {
    let mut log = recovery_log(cache).await?;
    let mut changed = false;
    for record in log.iter_mut().filter(|r| r.submission_id == submission_id) {
        record.synced = true;
        changed = true;
    }
    if changed {
        set_json(cache, keys::QUIZ_RESULTS, &log).await?;
    }
    Ok(())
}

/// Cache living for the lifetime of the process.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Cache persisted as one JSON file per key under a directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a half-written entry behind.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait]
impl SessionCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// View of a shared cache restricted to one namespace.
///
/// Each server-side session gets its own scope, so no two sessions ever
/// write the same key.
#[derive(Clone)]
pub struct ScopedCache {
    inner: Arc<dyn SessionCache>,
    scope: String,
}

impl ScopedCache {
    pub fn new(inner: Arc<dyn SessionCache>, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}.{}", self.scope, key)
    }
}

#[async_trait]
impl SessionCache for ScopedCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(&self.scoped(key)).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.inner.set(&self.scoped(key), value).await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.remove(&self.scoped(key)).await
    }
}
