use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::LevelId;
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level ordinal must be positive")]
    ZeroOrdinal,

    #[error("level title cannot be empty")]
    EmptyTitle,
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// An ordered set of themed questions, gated behind a per-user progress status.
///
/// A level may exist without questions (it is authored before it is filled);
/// starting a session against it is rejected at that point instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    id: LevelId,
    ordinal: u32,
    title: String,
    questions: Vec<Question>,
    created_at: DateTime<Utc>,
}

impl Level {
    /// Validates and builds a level.
    ///
    /// # Errors
    ///
    /// Returns `LevelError::ZeroOrdinal` for ordinal 0 and
    /// `LevelError::EmptyTitle` for a blank title.
    pub fn new(
        id: LevelId,
        ordinal: u32,
        title: impl Into<String>,
        questions: Vec<Question>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LevelError> {
        if ordinal == 0 {
            return Err(LevelError::ZeroOrdinal);
        }
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LevelError::EmptyTitle);
        }

        Ok(Self {
            id,
            ordinal,
            title,
            questions,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> LevelId {
        self.id
    }

    /// Position of this level in the progression (1-based).
    #[must_use]
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Ordinal of the level that a completed attempt unlocks.
    #[must_use]
    pub fn next_ordinal(&self) -> u32 {
        self.ordinal.saturating_add(1)
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Questions in presentation order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
