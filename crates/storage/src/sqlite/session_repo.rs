use async_trait::async_trait;

use quiz_core::model::{QuizSession, SessionId, SessionPreview};

use super::SqliteRepository;
use super::mapping::{
    UNSET_CHOSEN_ANSWER, join_answers, map_preview_row, map_session,
};
use crate::repository::{SessionRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionRepository for SqliteRepository {
    async fn save_session(&self, session: &QuizSession) -> Result<SessionId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO quiz_sessions (
                    session_id, taken_at, name, count_of_right_answers
                )
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(session.id().value())
        .bind(session.taken_at())
        .bind(session.name())
        .bind(i64::from(session.count_of_right_answers()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        for question in session.results() {
            sqlx::query(
                r"
                    INSERT INTO question_results (
                        session_id, question, category, difficulty,
                        correct_answer, all_answers, chosen_answer
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(session.id().value())
            .bind(question.prompt())
            .bind(question.category())
            .bind(question.difficulty())
            .bind(question.correct_answer())
            .bind(join_answers(question.all_answers()))
            .bind(question.chosen_answer().unwrap_or(UNSET_CHOSEN_ANSWER))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(session.id())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let Some(session_row) = sqlx::query(
            r"
                SELECT session_id, taken_at, name, count_of_right_answers
                FROM quiz_sessions
                WHERE session_id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        else {
            return Ok(None);
        };

        let question_rows = sqlx::query(
            r"
                SELECT question, category, difficulty, correct_answer,
                       all_answers, chosen_answer
                FROM question_results
                WHERE session_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        map_session(&session_row, &question_rows).map(Some)
    }

    async fn list_previews(&self) -> Result<Vec<SessionPreview>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT session_id, taken_at, name, count_of_right_answers
                FROM quiz_sessions
                ORDER BY taken_at DESC, session_id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_preview_row(&row)?);
        }
        Ok(out)
    }

    async fn rename_session(&self, id: SessionId, name: &str) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE quiz_sessions SET name = ?1 WHERE session_id = ?2")
            .bind(name)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_sessions WHERE session_id = ?1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_sessions")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
