use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};

use quiz_core::model::{QuizSession, SessionId};
use storage::repository::SessionRepository;

use crate::error::HistoryError;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Display-ready row for the session history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPreviewItem {
    pub session_id: SessionId,
    /// E.g. "9 July".
    pub date: String,
    /// E.g. "9:30".
    pub time: String,
    pub name: String,
    pub count_of_right_answers: u32,
}

/// Read-only consumer of the session store for the history list.
///
/// No business logic beyond selection and deletion bookkeeping; storage
/// failures propagate untouched and are not retried.
#[derive(Clone)]
pub struct SessionHistoryService {
    sessions: Arc<dyn SessionRepository>,
}

impl SessionHistoryService {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    /// List all sessions, newest first, formatted for display.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn list_previews(&self) -> Result<Vec<SessionPreviewItem>, HistoryError> {
        let previews = self.sessions.list_previews().await?;
        Ok(previews
            .into_iter()
            .map(|p| SessionPreviewItem {
                session_id: p.session_id,
                date: format_date(p.taken_at),
                time: format_time(p.taken_at),
                name: p.name,
                count_of_right_answers: p.count_of_right_answers,
            })
            .collect())
    }

    /// Load one full session by id.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn get_session(
        &self,
        id: SessionId,
    ) -> Result<Option<QuizSession>, HistoryError> {
        Ok(self.sessions.get_session(id).await?)
    }

    /// Rename a stored session.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` (`NotFound` inside) if the session
    /// does not exist.
    pub async fn rename_session(&self, id: SessionId, name: &str) -> Result<(), HistoryError> {
        Ok(self.sessions.rename_session(id, name).await?)
    }

    /// Delete one session.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn delete_session(&self, id: SessionId) -> Result<(), HistoryError> {
        Ok(self.sessions.delete_session(id).await?)
    }

    /// Delete every stored session.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn clear_all(&self) -> Result<(), HistoryError> {
        Ok(self.sessions.clear_all().await?)
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    let month = MONTHS
        .get(at.month0() as usize)
        .copied()
        .unwrap_or("January");
    format!("{} {month}", at.day())
}

fn format_time(at: DateTime<Utc>) -> String {
    format!("{}:{:02}", at.hour(), at.minute())
}
