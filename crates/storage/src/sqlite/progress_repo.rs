use chrono::{DateTime, Utc};
use quiz_core::model::{PlayerId, QuizProgress, UsedSet};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, encode_ids, level_from_i64, map_level_row, player_id_to_i64, question_id_from_i64,
    question_id_to_i64, ser, u32_from_i64,
};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self, player: PlayerId) -> Result<Option<QuizProgress>, StorageError> {
        let player_key = player_id_to_i64(player)?;

        let row = sqlx::query(
            r"
            SELECT current_level, attempts, started_at, updated_at
            FROM quiz_progress
            WHERE player_id = ?1
            ",
        )
        .bind(player_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let current_level = level_from_i64(row.try_get("current_level").map_err(ser)?)?;
        let attempts = u32_from_i64("attempts", row.try_get("attempts").map_err(ser)?)?;
        let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(ser)?;

        let used_rows = sqlx::query(
            r"
            SELECT question_id
            FROM used_questions
            WHERE player_id = ?1
            ORDER BY question_id ASC
            ",
        )
        .bind(player_key)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut used = UsedSet::new();
        for row in used_rows {
            used.extend([question_id_from_i64(
                row.try_get("question_id").map_err(ser)?,
            )?]);
        }

        let level_rows = sqlx::query(
            r"
            SELECT level, question_ids, requested, correct, drawn_at
            FROM level_records
            WHERE player_id = ?1
            ORDER BY level ASC
            ",
        )
        .bind(player_key)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut levels = Vec::with_capacity(level_rows.len());
        for row in level_rows {
            levels.push(map_level_row(&row)?);
        }

        QuizProgress::from_persisted(
            player,
            used,
            current_level,
            levels,
            attempts,
            started_at,
            updated_at,
        )
        .map(Some)
        .map_err(ser)
    }

    async fn save_progress(&self, progress: &QuizProgress) -> Result<(), StorageError> {
        let player_key = player_id_to_i64(progress.player_id())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO quiz_progress (player_id, current_level, attempts, started_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(player_id) DO UPDATE SET
                current_level = excluded.current_level,
                attempts = excluded.attempts,
                started_at = excluded.started_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(player_key)
        .bind(i64::from(progress.current_level().value()))
        .bind(i64::from(progress.attempts()))
        .bind(progress.started_at())
        .bind(progress.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Used set and level records are replaced wholesale; a retake shrinks them.
        sqlx::query("DELETE FROM used_questions WHERE player_id = ?1")
            .bind(player_key)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        for id in progress.used().iter() {
            sqlx::query("INSERT INTO used_questions (player_id, question_id) VALUES (?1, ?2)")
                .bind(player_key)
                .bind(question_id_to_i64(id)?)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        sqlx::query("DELETE FROM level_records WHERE player_id = ?1")
            .bind(player_key)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        for record in progress.levels() {
            sqlx::query(
                r"
                INSERT INTO level_records
                    (player_id, level, question_ids, requested, correct, drawn_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(player_key)
            .bind(i64::from(record.level().value()))
            .bind(encode_ids(record.questions())?)
            .bind(i64::from(record.requested()))
            .bind(record.correct().map(i64::from))
            .bind(record.drawn_at())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
