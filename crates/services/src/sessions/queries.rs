use chrono::{DateTime, Utc};

use quiz_core::model::{Level, ProgressStatus, UserId};
use quiz_core::session::QuizSession;
use storage::repository::{LevelRepository, ProgressRepository};

use crate::error::QuizLoopError;

/// Storage-backed session lookups and gate checks.
pub(crate) struct SessionQueries;

impl SessionQueries {
    /// Load a level by ordinal, check the user's gate and start a session.
    ///
    /// The first level is always playable; every later ordinal requires a
    /// progress record that is not locked.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::LevelNotFound` for an unknown ordinal,
    /// `QuizLoopError::LevelLocked` when the gate is shut,
    /// `QuizLoopError::Session` when the level has no questions, or
    /// `QuizLoopError::Storage` on repository failures.
    pub async fn start_from_storage(
        user: UserId,
        ordinal: u32,
        levels: &dyn LevelRepository,
        progress: &dyn ProgressRepository,
        now: DateTime<Utc>,
    ) -> Result<(Level, QuizSession), QuizLoopError> {
        let level = levels
            .get_level(ordinal)
            .await?
            .ok_or(QuizLoopError::LevelNotFound(ordinal))?;

        if ordinal > 1 {
            let unlocked = progress
                .get_progress(user, ordinal)
                .await?
                .is_some_and(|record| record.status != ProgressStatus::Locked);
            if !unlocked {
                return Err(QuizLoopError::LevelLocked(ordinal));
            }
        }

        let session = QuizSession::start(&level, now)?;
        Ok((level, session))
    }
}
