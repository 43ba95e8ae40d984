use async_trait::async_trait;
use quiz_core::model::{Level, ProgressRecord, ProgressStatus, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for levels and their questions.
#[async_trait]
pub trait LevelRepository: Send + Sync {
    /// Persist or update a level together with its question set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the level cannot be stored.
    async fn upsert_level(&self, level: &Level) -> Result<(), StorageError>;

    /// Fetch a level by its progression ordinal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; a missing level is `Ok(None)`.
    async fn get_level(&self, ordinal: u32) -> Result<Option<Level>, StorageError>;

    /// List levels in ordinal order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_levels(&self, limit: u32) -> Result<Vec<Level>, StorageError>;
}

/// Repository contract for per-user level progress.
///
/// Writes are monotonic: the status of a record never goes backwards and
/// the high score only ever grows. The quiz engine relies on this when it
/// re-emits unlock intents without reading prior status.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch one user's record for a level ordinal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures; no record yet is `Ok(None)`.
    async fn get_progress(
        &self,
        user: UserId,
        level_ordinal: u32,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// List one user's records in ordinal order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_progress(&self, user: UserId) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Upsert a record without downgrading status or lowering the high score.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is rejected.
    async fn record_progress(
        &self,
        user: UserId,
        level_ordinal: u32,
        status: ProgressStatus,
        high_score: u32,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    levels: Arc<Mutex<HashMap<u32, Level>>>,
    progress: Arc<Mutex<HashMap<(UserId, u32), ProgressRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LevelRepository for InMemoryRepository {
    async fn upsert_level(&self, level: &Level) -> Result<(), StorageError> {
        let mut guard = self
            .levels
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(level.ordinal(), level.clone());
        Ok(())
    }

    async fn get_level(&self, ordinal: u32) -> Result<Option<Level>, StorageError> {
        let guard = self
            .levels
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&ordinal).cloned())
    }

    async fn list_levels(&self, limit: u32) -> Result<Vec<Level>, StorageError> {
        let guard = self
            .levels
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut levels: Vec<Level> = guard.values().cloned().collect();
        levels.sort_by_key(Level::ordinal);
        levels.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(levels)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        user: UserId,
        level_ordinal: u32,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user, level_ordinal)).cloned())
    }

    async fn list_progress(&self, user: UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<ProgressRecord> = guard
            .values()
            .filter(|r| r.user == user)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.level_ordinal);
        Ok(records)
    }

    async fn record_progress(
        &self,
        user: UserId,
        level_ordinal: u32,
        status: ProgressStatus,
        high_score: u32,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let entry = guard
            .entry((user, level_ordinal))
            .or_insert_with(|| ProgressRecord {
                user,
                level_ordinal,
                status: ProgressStatus::Locked,
                high_score: 0,
            });
        if status.rank() > entry.status.rank() {
            entry.status = status;
        }
        entry.high_score = entry.high_score.max(high_score);
        Ok(())
    }
}

/// Aggregates level and progress repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub levels: Arc<dyn LevelRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let levels: Arc<dyn LevelRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { levels, progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{LevelId, Question, QuestionId};
    use quiz_core::time::fixed_now;

    fn build_level(ordinal: u32) -> Level {
        let questions = vec![
            Question::new(
                QuestionId::new(u64::from(ordinal) * 10 + 1),
                "Q1",
                None,
                vec!["a".into(), "b".into()],
                "a",
            )
            .unwrap(),
            Question::new(
                QuestionId::new(u64::from(ordinal) * 10 + 2),
                "Q2",
                None,
                vec!["c".into(), "d".into()],
                "d",
            )
            .unwrap(),
        ];
        Level::new(
            LevelId::new(u64::from(ordinal)),
            ordinal,
            format!("Level {ordinal}"),
            questions,
            fixed_now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn round_trips_level_by_ordinal() {
        let repo = InMemoryRepository::new();
        let level = build_level(2);
        repo.upsert_level(&level).await.unwrap();

        let fetched = repo.get_level(2).await.unwrap().expect("level stored");
        assert_eq!(fetched, level);
        assert!(repo.get_level(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_levels_in_ordinal_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_level(&build_level(3)).await.unwrap();
        repo.upsert_level(&build_level(1)).await.unwrap();
        repo.upsert_level(&build_level(2)).await.unwrap();

        let levels = repo.list_levels(10).await.unwrap();
        let ordinals: Vec<u32> = levels.iter().map(Level::ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn progress_status_never_downgrades() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();

        repo.record_progress(user, 1, ProgressStatus::Completed, 5)
            .await
            .unwrap();
        repo.record_progress(user, 1, ProgressStatus::Unlocked, 0)
            .await
            .unwrap();

        let record = repo.get_progress(user, 1).await.unwrap().unwrap();
        assert_eq!(record.status, ProgressStatus::Completed);
        assert_eq!(record.high_score, 5);
    }

    #[tokio::test]
    async fn high_score_only_grows() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();

        repo.record_progress(user, 1, ProgressStatus::Completed, 3)
            .await
            .unwrap();
        repo.record_progress(user, 1, ProgressStatus::Completed, 5)
            .await
            .unwrap();
        repo.record_progress(user, 1, ProgressStatus::Completed, 4)
            .await
            .unwrap();

        let record = repo.get_progress(user, 1).await.unwrap().unwrap();
        assert_eq!(record.high_score, 5);
    }

    #[tokio::test]
    async fn unlock_is_idempotent() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();

        repo.record_progress(user, 2, ProgressStatus::Unlocked, 0)
            .await
            .unwrap();
        repo.record_progress(user, 2, ProgressStatus::Unlocked, 0)
            .await
            .unwrap();

        let records = repo.list_progress(user).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ProgressStatus::Unlocked);
    }

    #[tokio::test]
    async fn progress_is_scoped_per_user() {
        let repo = InMemoryRepository::new();
        let alice = UserId::random();
        let bob = UserId::random();

        repo.record_progress(alice, 1, ProgressStatus::Completed, 5)
            .await
            .unwrap();

        assert!(repo.get_progress(bob, 1).await.unwrap().is_none());
        assert_eq!(repo.list_progress(bob).await.unwrap().len(), 0);
    }
}
