use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{Question, QuizSession, SessionId};
use storage::repository::SessionRepository;

use crate::error::SessionSaveError;

/// Maps one finished attempt into a persisted session.
///
/// Called exactly once per finished quiz; the session id is derived from the
/// completion time (epoch millis), which keeps ids monotonically related to
/// time.
#[derive(Clone)]
pub struct SessionRecorder {
    clock: Clock,
    sessions: Arc<dyn SessionRepository>,
}

impl SessionRecorder {
    #[must_use]
    pub fn new(clock: Clock, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { clock, sessions }
    }

    /// Persist a finished attempt: one session row plus one row per answered
    /// question.
    ///
    /// # Errors
    ///
    /// Returns `SessionSaveError::Session` if the count disagrees with the
    /// results, `SessionSaveError::Storage` on persistence failure. The
    /// operation is never retried here.
    pub async fn save_session(
        &self,
        count_of_right_answers: u32,
        questions: &[Question],
    ) -> Result<SessionId, SessionSaveError> {
        let taken_at = self.clock.now();
        let id = SessionId::new(taken_at.timestamp_millis());
        let name = format!("Quiz {}", taken_at.format("%Y-%m-%d %H:%M"));

        let session = QuizSession::from_persisted(
            id,
            taken_at,
            name,
            count_of_right_answers,
            questions.to_vec(),
        )?;

        let id = self.sessions.save_session(&session).await?;
        Ok(id)
    }
}
