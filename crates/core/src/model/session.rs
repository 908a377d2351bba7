use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Question, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("count of right answers ({stored}) does not match the results ({actual})")]
    CountMismatch { stored: u32, actual: u32 },

    #[error("too many results for a single session: {len}")]
    TooManyResults { len: usize },
}

/// A persisted, finished quiz attempt.
///
/// Immutable once created except for an optional rename, which is handled at
/// the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    id: SessionId,
    taken_at: DateTime<Utc>,
    name: String,
    count_of_right_answers: u32,
    results: Vec<Question>,
}

impl QuizSession {
    /// Build a session from a finished attempt, computing the score from the
    /// answered questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TooManyResults` if the result count cannot fit
    /// in `u32`.
    pub fn new_finished(
        id: SessionId,
        taken_at: DateTime<Utc>,
        name: impl Into<String>,
        results: Vec<Question>,
    ) -> Result<Self, SessionError> {
        let correct = count_correct(&results)?;
        Ok(Self {
            id,
            taken_at,
            name: name.into(),
            count_of_right_answers: correct,
            results,
        })
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CountMismatch` if the stored count disagrees
    /// with a recount of the results.
    pub fn from_persisted(
        id: SessionId,
        taken_at: DateTime<Utc>,
        name: String,
        count_of_right_answers: u32,
        results: Vec<Question>,
    ) -> Result<Self, SessionError> {
        let actual = count_correct(&results)?;
        if actual != count_of_right_answers {
            return Err(SessionError::CountMismatch {
                stored: count_of_right_answers,
                actual,
            });
        }

        Ok(Self {
            id,
            taken_at,
            name,
            count_of_right_answers,
            results,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn count_of_right_answers(&self) -> u32 {
        self.count_of_right_answers
    }

    #[must_use]
    pub fn results(&self) -> &[Question] {
        &self.results
    }

    /// Derive the list projection of this session.
    #[must_use]
    pub fn preview(&self) -> SessionPreview {
        SessionPreview {
            session_id: self.id,
            taken_at: self.taken_at,
            name: self.name.clone(),
            count_of_right_answers: self.count_of_right_answers,
        }
    }
}

fn count_correct(results: &[Question]) -> Result<u32, SessionError> {
    let correct = results.iter().filter(|q| q.is_correct()).count();
    u32::try_from(correct).map_err(|_| SessionError::TooManyResults {
        len: results.len(),
    })
}

/// Read-only list projection of a session, always regenerable from the full
/// `QuizSession`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPreview {
    pub session_id: SessionId,
    pub taken_at: DateTime<Utc>,
    pub name: String,
    pub count_of_right_answers: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn answered(prompt: &str, correct: &str, chosen: &str) -> Question {
        Question::from_persisted(
            prompt.to_owned(),
            "General".to_owned(),
            "easy".to_owned(),
            correct.to_owned(),
            vec![correct.to_owned(), "other".to_owned()],
            Some(chosen.to_owned()),
        )
        .unwrap()
    }

    #[test]
    fn new_finished_counts_right_answers() {
        let results = vec![
            answered("Q1", "A", "A"),
            answered("Q2", "B", "wrong"),
            answered("Q3", "C", "C"),
        ];
        let session =
            QuizSession::new_finished(SessionId::new(1), fixed_now(), "Quiz", results).unwrap();
        assert_eq!(session.count_of_right_answers(), 2);
    }

    #[test]
    fn from_persisted_rejects_count_mismatch() {
        let results = vec![answered("Q1", "A", "A")];
        let err = QuizSession::from_persisted(
            SessionId::new(1),
            fixed_now(),
            "Quiz".to_owned(),
            3,
            results,
        )
        .unwrap_err();
        assert_eq!(err, SessionError::CountMismatch { stored: 3, actual: 1 });
    }

    #[test]
    fn preview_mirrors_session_fields() {
        let session = QuizSession::new_finished(
            SessionId::new(42),
            fixed_now(),
            "Evening round",
            vec![answered("Q1", "A", "A")],
        )
        .unwrap();

        let preview = session.preview();
        assert_eq!(preview.session_id, session.id());
        assert_eq!(preview.taken_at, session.taken_at());
        assert_eq!(preview.name, session.name());
        assert_eq!(
            preview.count_of_right_answers,
            session.count_of_right_answers()
        );
    }
}
