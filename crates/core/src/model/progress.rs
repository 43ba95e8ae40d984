use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressStatusError {
    #[error("invalid progress status: {0}")]
    Invalid(String),

    #[error("invalid progress status code: {0}")]
    InvalidCode(i64),
}

//
// ─── PROGRESS STATUS ───────────────────────────────────────────────────────────
//

/// Per-user gate for a level.
///
/// Statuses are totally ordered so that storage can refuse downgrades:
/// an already-completed level never falls back to unlocked, and an
/// unlocked level never re-locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Locked,
    Unlocked,
    Completed,
}

impl ProgressStatus {
    /// Monotonic rank used for the no-downgrade rule.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            ProgressStatus::Locked => 0,
            ProgressStatus::Unlocked => 1,
            ProgressStatus::Completed => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::Locked => "locked",
            ProgressStatus::Unlocked => "unlocked",
            ProgressStatus::Completed => "completed",
        }
    }

    /// Decodes the integer rank used by storage rows.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStatusError::InvalidCode` for an unknown rank.
    pub fn from_code(code: i64) -> Result<Self, ProgressStatusError> {
        match code {
            0 => Ok(ProgressStatus::Locked),
            1 => Ok(ProgressStatus::Unlocked),
            2 => Ok(ProgressStatus::Completed),
            _ => Err(ProgressStatusError::InvalidCode(code)),
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = ProgressStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(ProgressStatus::Locked),
            "unlocked" => Ok(ProgressStatus::Unlocked),
            "completed" => Ok(ProgressStatus::Completed),
            other => Err(ProgressStatusError::Invalid(other.to_string())),
        }
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Persisted (user, level) progress row, owned by the storage collaborator.
///
/// The engine only ever writes to it through `ProgressUpdate` intents; it
/// never reads prior status to make gameplay decisions mid-session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub user: UserId,
    pub level_ordinal: u32,
    pub status: ProgressStatus,
    pub high_score: u32,
}

/// The single write intent a terminal session emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Ordinal of the level that was attempted.
    pub level_ordinal: u32,
    /// New status for that level's record.
    pub status: ProgressStatus,
    /// Score to offer as a high-score candidate (0 for failed attempts).
    pub high_score: u32,
    /// Ordinal to unlock, set on completed attempts only. Saturated at the
    /// ordinal ceiling, matching `Level::next_ordinal`.
    pub unlock_ordinal: Option<u32>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ranks_are_monotonic() {
        assert!(ProgressStatus::Locked.rank() < ProgressStatus::Unlocked.rank());
        assert!(ProgressStatus::Unlocked.rank() < ProgressStatus::Completed.rank());
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            ProgressStatus::Locked,
            ProgressStatus::Unlocked,
            ProgressStatus::Completed,
        ] {
            let parsed: ProgressStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn status_code_roundtrip() {
        for status in [
            ProgressStatus::Locked,
            ProgressStatus::Unlocked,
            ProgressStatus::Completed,
        ] {
            let decoded = ProgressStatus::from_code(i64::from(status.rank())).unwrap();
            assert_eq!(decoded, status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "done".parse::<ProgressStatus>().unwrap_err();
        assert!(matches!(err, ProgressStatusError::Invalid(ref s) if s == "done"));
        let err = ProgressStatus::from_code(9).unwrap_err();
        assert!(matches!(err, ProgressStatusError::InvalidCode(9)));
    }
}
