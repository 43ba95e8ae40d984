use quiz_core::model::{Level, Question};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    id_to_i64, image_ref_from_string, image_ref_to_string, level_id_from_i64, ordinal_from_i64,
    question_id_from_i64, ser,
};
use crate::repository::{LevelRepository, StorageError};

#[async_trait::async_trait]
impl LevelRepository for SqliteRepository {
    async fn upsert_level(&self, level: &Level) -> Result<(), StorageError> {
        let level_id = id_to_i64("level_id", level.id().value())?;
        let ordinal = i64::from(level.ordinal());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO levels (id, ordinal, title, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                ordinal = excluded.ordinal,
                title = excluded.title
            ",
        )
        .bind(level_id)
        .bind(ordinal)
        .bind(level.title())
        .bind(level.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Question rows are replaced wholesale; the set is small and ordered.
        sqlx::query("DELETE FROM questions WHERE level_id = ?1")
            .bind(level_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for (position, question) in level.questions().iter().enumerate() {
            let question_id = id_to_i64("question_id", question.id().value())?;
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;

            sqlx::query(
                r"
                INSERT INTO questions (id, level_id, position, prompt, image_ref, correct_answer)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(question_id)
            .bind(level_id)
            .bind(position)
            .bind(question.prompt())
            .bind(image_ref_to_string(question.image()))
            .bind(question.correct_answer())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            for (option_position, option) in question.options().iter().enumerate() {
                let option_position = i64::try_from(option_position)
                    .map_err(|_| StorageError::Serialization("position overflow".into()))?;
                sqlx::query(
                    r"
                    INSERT INTO question_options (question_id, position, option_text)
                    VALUES (?1, ?2, ?3)
                    ",
                )
                .bind(question_id)
                .bind(option_position)
                .bind(option)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn get_level(&self, ordinal: u32) -> Result<Option<Level>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, ordinal, title, created_at
            FROM levels WHERE ordinal = ?1
            ",
        )
        .bind(i64::from(ordinal))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => self.hydrate_level(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_levels(&self, limit: u32) -> Result<Vec<Level>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, ordinal, title, created_at
            FROM levels
            ORDER BY ordinal ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut levels = Vec::with_capacity(rows.len());
        for row in rows {
            levels.push(self.hydrate_level(&row).await?);
        }
        Ok(levels)
    }
}

impl SqliteRepository {
    async fn hydrate_level(&self, row: &SqliteRow) -> Result<Level, StorageError> {
        let level_id = level_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
        let level_id_i64 = id_to_i64("level_id", level_id.value())?;

        let question_rows = sqlx::query(
            r"
            SELECT id, prompt, image_ref, correct_answer
            FROM questions
            WHERE level_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(level_id_i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(question_rows.len());
        for question_row in &question_rows {
            questions.push(self.hydrate_question(question_row).await?);
        }

        Level::new(
            level_id,
            ordinal_from_i64(row.try_get::<i64, _>("ordinal").map_err(ser)?)?,
            row.try_get::<String, _>("title").map_err(ser)?,
            questions,
            row.try_get("created_at").map_err(ser)?,
        )
        .map_err(ser)
    }

    async fn hydrate_question(&self, row: &SqliteRow) -> Result<Question, StorageError> {
        let question_id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;

        let option_rows = sqlx::query(
            r"
            SELECT option_text
            FROM question_options
            WHERE question_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id_to_i64("question_id", question_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut options = Vec::with_capacity(option_rows.len());
        for option_row in option_rows {
            options.push(option_row.try_get::<String, _>("option_text").map_err(ser)?);
        }

        Question::new(
            question_id,
            row.try_get::<String, _>("prompt").map_err(ser)?,
            image_ref_from_string(row.try_get::<Option<String>, _>("image_ref").map_err(ser)?)?,
            options,
            row.try_get::<String, _>("correct_answer").map_err(ser)?,
        )
        .map_err(ser)
    }
}
