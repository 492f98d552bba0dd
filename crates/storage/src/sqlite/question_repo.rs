use std::collections::HashMap;

use quiz_core::model::{Question, QuestionDraft, QuestionId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, question_id_from_i64, question_id_to_i64, ser};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn count_questions(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM questions")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        let count: i64 = row.try_get("n").map_err(ser)?;
        u64::try_from(count).map_err(ser)
    }

    async fn insert_question(&self, draft: QuestionDraft) -> Result<Question, StorageError> {
        let draft = draft.normalize().map_err(ser)?;

        // Ids are assigned by the INSERT itself, under the write lock.
        let row = sqlx::query(
            r"
            INSERT INTO questions (id, prompt, choices, correct_choice, reference)
            SELECT COALESCE(MAX(id), 0) + 1, ?1, ?2, ?3, ?4 FROM questions
            RETURNING id
            ",
        )
        .bind(draft.prompt.as_str())
        .bind(serde_json::to_string(&draft.choices).map_err(ser)?)
        .bind(i64::try_from(draft.correct_choice).map_err(ser)?)
        .bind(draft.reference.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        let id = question_id_from_i64(row.try_get("id").map_err(ser)?)?;
        draft.validate(id).map_err(ser)
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r"
            SELECT id, prompt, choices, correct_choice, reference
            FROM questions
            WHERE id IN (
            ",
        );
        for i in 0..ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 1).to_string());
        }
        sql.push_str(")\n");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(question_id_to_i64(*id)?);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        let mut by_id: HashMap<QuestionId, Question> = HashMap::with_capacity(rows.len());
        for row in rows {
            let question = map_question_row(&row)?;
            by_id.insert(question.id(), question);
        }

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            // cloned rather than removed: the same id may be requested twice
            match by_id.get(id) {
                Some(question) => out.push(question.clone()),
                None => return Err(StorageError::NotFound),
            }
        }
        Ok(out)
    }
}
