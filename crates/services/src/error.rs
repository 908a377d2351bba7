//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, SessionError};
use storage::repository::StorageError;

/// Errors emitted by a quiz source.
///
/// All of these are caught at the client boundary and surfaced as a typed
/// result; nothing propagates an exception past the fetch seam.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizFetchError {
    #[error("quiz API returned error code {0}")]
    Api(i32),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Errors emitted while persisting a finished attempt.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionSaveError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionHistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
