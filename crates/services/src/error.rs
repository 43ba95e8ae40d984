//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::session::SessionError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the speech collaborators.
///
/// `Unsupported` is an expected condition, not an exceptional one: the quiz
/// stays playable via direct selection and callers should check
/// `is_supported()` up front.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpeechError {
    #[error("speech support is not configured")]
    Unsupported,
    #[error("transcription returned an empty transcript")]
    EmptyTranscript,
    #[error("speech request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizLoopError {
    #[error("level {0} not found")]
    LevelNotFound(u32),
    #[error("level {0} is not unlocked for this user")]
    LevelLocked(u32),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
