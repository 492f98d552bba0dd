use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies schema versions that are not yet recorded in `schema_migrations`.
///
/// Version 1 creates the question store and the per-player progress tables.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id INTEGER PRIMARY KEY CHECK (id >= 1),
                    prompt TEXT NOT NULL,
                    choices TEXT NOT NULL,
                    correct_choice INTEGER NOT NULL CHECK (correct_choice >= 0),
                    reference TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_progress (
                    player_id INTEGER PRIMARY KEY,
                    current_level INTEGER NOT NULL CHECK (current_level >= 1),
                    attempts INTEGER NOT NULL CHECK (attempts >= 0),
                    started_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS used_questions (
                    player_id INTEGER NOT NULL,
                    question_id INTEGER NOT NULL,
                    PRIMARY KEY (player_id, question_id),
                    FOREIGN KEY (player_id) REFERENCES quiz_progress(player_id) ON DELETE CASCADE,
                    FOREIGN KEY (question_id) REFERENCES questions(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS level_records (
                    player_id INTEGER NOT NULL,
                    level INTEGER NOT NULL CHECK (level >= 1),
                    question_ids TEXT NOT NULL,
                    requested INTEGER NOT NULL CHECK (requested >= 0),
                    correct INTEGER CHECK (correct IS NULL OR correct >= 0),
                    drawn_at TEXT NOT NULL,
                    PRIMARY KEY (player_id, level),
                    FOREIGN KEY (player_id) REFERENCES quiz_progress(player_id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
