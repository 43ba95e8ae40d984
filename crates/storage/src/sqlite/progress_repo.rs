use quiz_core::model::{ProgressRecord, ProgressStatus, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{ordinal_from_i64, score_from_i64, ser, status_from_i64, user_id_from_str};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user: UserId,
        level_ordinal: u32,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, level_ordinal, status, high_score
            FROM progress
            WHERE user_id = ?1 AND level_ordinal = ?2
            ",
        )
        .bind(user.to_string())
        .bind(i64::from(level_ordinal))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => progress_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_progress(&self, user: UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, level_ordinal, status, high_score
            FROM progress
            WHERE user_id = ?1
            ORDER BY level_ordinal ASC
            ",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(progress_from_row(&row)?);
        }
        Ok(records)
    }

    async fn record_progress(
        &self,
        user: UserId,
        level_ordinal: u32,
        status: ProgressStatus,
        high_score: u32,
    ) -> Result<(), StorageError> {
        // Status codes are the monotonic ranks, so MAX() enforces the
        // no-downgrade rule for status and high score alike.
        sqlx::query(
            r"
            INSERT INTO progress (user_id, level_ordinal, status, high_score)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, level_ordinal) DO UPDATE SET
                status = MAX(progress.status, excluded.status),
                high_score = MAX(progress.high_score, excluded.high_score)
            ",
        )
        .bind(user.to_string())
        .bind(i64::from(level_ordinal))
        .bind(i64::from(status.rank()))
        .bind(i64::from(high_score))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}

fn progress_from_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    Ok(ProgressRecord {
        user: user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        level_ordinal: ordinal_from_i64(row.try_get::<i64, _>("level_ordinal").map_err(ser)?)?,
        status: status_from_i64(row.try_get::<i64, _>("status").map_err(ser)?)?,
        high_score: score_from_i64(row.try_get::<i64, _>("high_score").map_err(ser)?)?,
    })
}
