use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use quiz_core::model::{QuizSession, SessionId, SessionPreview};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for finished quiz sessions.
///
/// One writer per finished attempt, many readers for history. Operations are
/// not retried here; callers decide what a failure means for them.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a finished session together with its question results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn save_session(&self, session: &QuizSession) -> Result<SessionId, StorageError>;

    /// Fetch a full session by id, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage faults.
    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError>;

    /// List previews of all sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage faults.
    async fn list_previews(&self) -> Result<Vec<SessionPreview>, StorageError>;

    /// Rename a session after the fact.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn rename_session(&self, id: SessionId, name: &str) -> Result<(), StorageError>;

    /// Delete one session and its question results.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage faults.
    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError>;

    /// Delete every stored session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage faults.
    async fn clear_all(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<BTreeMap<SessionId, QuizSession>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn save_session(&self, session: &QuizSession) -> Result<SessionId, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(session.id(), session.clone());
        Ok(session.id())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_previews(&self) -> Result<Vec<SessionPreview>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        // Ids are time-derived, so reverse key order is newest first.
        Ok(guard.values().rev().map(QuizSession::preview).collect())
    }

    async fn rename_session(&self, id: SessionId, name: &str) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session = guard.get(&id).ok_or(StorageError::NotFound)?;
        let renamed = QuizSession::from_persisted(
            session.id(),
            session.taken_at(),
            name.to_owned(),
            session.count_of_right_answers(),
            session.results().to_vec(),
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.insert(id, renamed);
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&id);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.clear();
        Ok(())
    }
}

/// Aggregates the session repository behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemoryRepository::new()),
        }
    }
}
