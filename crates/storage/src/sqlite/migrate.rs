use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema: levels, questions with their option rows, and
/// per-user progress.
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

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS levels (
                    id INTEGER PRIMARY KEY,
                    ordinal INTEGER NOT NULL UNIQUE CHECK (ordinal > 0),
                    title TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id INTEGER NOT NULL,
                    level_id INTEGER NOT NULL,
                    position INTEGER NOT NULL,
                    prompt TEXT NOT NULL,
                    image_ref TEXT,
                    correct_answer TEXT NOT NULL,
                    PRIMARY KEY (id),
                    FOREIGN KEY (level_id) REFERENCES levels(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS question_options (
                    question_id INTEGER NOT NULL,
                    position INTEGER NOT NULL,
                    option_text TEXT NOT NULL,
                    PRIMARY KEY (question_id, position),
                    FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress (
                    user_id TEXT NOT NULL,
                    level_ordinal INTEGER NOT NULL CHECK (level_ordinal > 0),
                    status INTEGER NOT NULL CHECK (status BETWEEN 0 AND 2),
                    high_score INTEGER NOT NULL DEFAULT 0 CHECK (high_score >= 0),
                    PRIMARY KEY (user_id, level_ordinal)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_questions_level ON questions(level_id, position);",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_progress_user ON progress(user_id);")
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (1, ?1)")
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
