use sqlx::Row;

use quiz_core::model::{Question, QuizSession, SessionId, SessionPreview};

use crate::repository::StorageError;

/// Literal separator between serialized answer-list elements.
///
/// Splitting is lossy if any answer text contains this exact literal; the
/// quiz source has never produced such answers, so this stays as-is.
pub const ANSWER_SEPARATOR: &str = ";;;";

/// Stored in place of a chosen answer that was somehow never set. Defensive
/// fallback only; a finished attempt always confirms every question.
pub(crate) const UNSET_CHOSEN_ANSWER: &str = "undefined";

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Serialize an answer list into a single column value.
#[must_use]
pub fn join_answers(answers: &[String]) -> String {
    answers.join(ANSWER_SEPARATOR)
}

/// Deserialize an answer-list column. The empty string maps back to an empty
/// list.
#[must_use]
pub fn split_answers(data: &str) -> Vec<String> {
    if data.is_empty() {
        Vec::new()
    } else {
        data.split(ANSWER_SEPARATOR).map(str::to_owned).collect()
    }
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let all_answers = split_answers(&row.try_get::<String, _>("all_answers").map_err(ser)?);
    let chosen: String = row.try_get("chosen_answer").map_err(ser)?;

    Question::from_persisted(
        row.try_get("question").map_err(ser)?,
        row.try_get("category").map_err(ser)?,
        row.try_get("difficulty").map_err(ser)?,
        row.try_get("correct_answer").map_err(ser)?,
        all_answers,
        Some(chosen),
    )
    .map_err(ser)
}

pub(crate) fn map_preview_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<SessionPreview, StorageError> {
    Ok(SessionPreview {
        session_id: SessionId::new(row.try_get::<i64, _>("session_id").map_err(ser)?),
        taken_at: row.try_get("taken_at").map_err(ser)?,
        name: row.try_get("name").map_err(ser)?,
        count_of_right_answers: count_from_i64(
            row.try_get::<i64, _>("count_of_right_answers").map_err(ser)?,
        )?,
    })
}

pub(crate) fn map_session(
    session_row: &sqlx::sqlite::SqliteRow,
    question_rows: &[sqlx::sqlite::SqliteRow],
) -> Result<QuizSession, StorageError> {
    let mut results = Vec::with_capacity(question_rows.len());
    for row in question_rows {
        results.push(map_question_row(row)?);
    }

    QuizSession::from_persisted(
        SessionId::new(session_row.try_get::<i64, _>("session_id").map_err(ser)?),
        session_row.try_get("taken_at").map_err(ser)?,
        session_row.try_get("name").map_err(ser)?,
        count_from_i64(
            session_row
                .try_get::<i64, _>("count_of_right_answers")
                .map_err(ser)?,
        )?,
        results,
    )
    .map_err(ser)
}

fn count_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v)
        .map_err(|_| StorageError::Serialization(format!("invalid count_of_right_answers: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_list_round_trips() {
        let answers = vec!["A".to_owned(), "B".to_owned(), "C".to_owned()];
        let joined = join_answers(&answers);
        assert_eq!(joined, "A;;;B;;;C");
        assert_eq!(split_answers(&joined), answers);
    }

    #[test]
    fn empty_list_round_trips_through_empty_string() {
        assert_eq!(join_answers(&[]), "");
        assert_eq!(split_answers(""), Vec::<String>::new());
    }

    #[test]
    fn separator_inside_an_answer_is_lossy() {
        // Known fragility: an element containing the literal separator splits
        // into multiple elements on the way back.
        let answers = vec!["A;;;B".to_owned()];
        let joined = join_answers(&answers);
        assert_eq!(split_answers(&joined), vec!["A".to_owned(), "B".to_owned()]);
    }
}
