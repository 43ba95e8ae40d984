use std::sync::Arc;

use quiz_core::model::{ProgressStatus, UserId};
use quiz_core::normalizer::{ResolvedOption, resolve_utterance};
use quiz_core::session::{AnswerFeedback, QuizSession, SessionError};
use storage::repository::{LevelRepository, ProgressRepository};

use super::progress::SessionProgress;
use super::queries::SessionQueries;
use crate::Clock;
use crate::error::QuizLoopError;
use crate::speech::SpeechPlayback;

/// Result of judging a single answer in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub feedback: AnswerFeedback,
    pub progress: SessionProgress,
    /// Whether the terminal progress update has been written to storage.
    pub progress_saved: bool,
}

/// Result of submitting a spoken utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum SpokenOutcome {
    /// Nothing cleared the acceptance threshold; the caller should
    /// re-prompt instead of guessing.
    NoMatch,
    /// The utterance resolved to an option, which was answered normally.
    Answered {
        resolved: ResolvedOption,
        outcome: AnswerOutcome,
    },
}

/// Orchestrates level attempts: session start, answer judging and the
/// terminal progress write.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    levels: Arc<dyn LevelRepository>,
    progress: Arc<dyn ProgressRepository>,
    playback: Option<Arc<dyn SpeechPlayback>>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        levels: Arc<dyn LevelRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            levels,
            progress,
            playback: None,
        }
    }

    #[must_use]
    pub fn with_playback(mut self, playback: Arc<dyn SpeechPlayback>) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Start a new attempt at the level with the given ordinal.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError` for unknown or locked levels, empty levels
    /// and storage failures.
    pub async fn start_session(
        &self,
        user: UserId,
        ordinal: u32,
    ) -> Result<QuizSession, QuizLoopError> {
        let now = self.clock.now();
        let (_level, session) = SessionQueries::start_from_storage(
            user,
            ordinal,
            self.levels.as_ref(),
            self.progress.as_ref(),
            now,
        )
        .await?;
        Ok(session)
    }

    /// Judge a directly selected answer and, on the terminal transition,
    /// persist the progress update exactly once.
    ///
    /// When the write fails the session keeps its outcome in memory, so the
    /// caller can surface the failure and retry via `finalize_progress`.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::Session` for submissions to a terminal
    /// session and `QuizLoopError::Storage` when the progress write fails.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        user: UserId,
        candidate: &str,
    ) -> Result<AnswerOutcome, QuizLoopError> {
        let now = self.clock.now();
        let feedback = session.submit_answer(candidate, now)?;

        if session.is_finished() && !session.progress_saved() {
            self.persist_outcome(session, user).await?;
        }

        Ok(AnswerOutcome {
            feedback,
            progress: SessionProgress::of(session),
            progress_saved: session.progress_saved(),
        })
    }

    /// Resolve a spoken utterance against the current question's options and
    /// submit the resolved option as a normal answer.
    ///
    /// An utterance below the acceptance threshold yields
    /// `SpokenOutcome::NoMatch` so the caller can re-prompt; it is not an
    /// error and does not touch the session.
    ///
    /// # Errors
    ///
    /// Same as [`QuizLoopService::answer_current`].
    pub async fn answer_spoken(
        &self,
        session: &mut QuizSession,
        user: UserId,
        utterance: &str,
    ) -> Result<SpokenOutcome, QuizLoopError> {
        let resolved = {
            let question = session
                .current_question()
                .ok_or(SessionError::Finished)?;
            resolve_utterance(utterance, question.options())
        };

        match resolved {
            None => Ok(SpokenOutcome::NoMatch),
            Some(resolved) => {
                let outcome = self.answer_current(session, user, &resolved.option).await?;
                Ok(SpokenOutcome::Answered { resolved, outcome })
            }
        }
    }

    /// Read the current question aloud through the playback collaborator.
    ///
    /// Playback problems are logged and swallowed; they never fail the
    /// session.
    pub async fn speak_current(&self, session: &QuizSession) {
        let Some(playback) = &self.playback else {
            return;
        };
        let Some(question) = session.current_question() else {
            return;
        };
        if let Err(err) = playback.speak(question.prompt()).await {
            tracing::warn!(error = %err, "question playback failed");
        }
    }

    /// Retry the terminal progress write after a failed attempt.
    ///
    /// No-op when the update is already persisted.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::Session` if the session is not terminal and
    /// `QuizLoopError::Storage` if persistence fails again.
    pub async fn finalize_progress(
        &self,
        session: &mut QuizSession,
        user: UserId,
    ) -> Result<(), QuizLoopError> {
        if session.progress_saved() {
            return Ok(());
        }
        if !session.is_finished() {
            return Err(SessionError::NotFinished.into());
        }
        self.persist_outcome(session, user).await
    }

    async fn persist_outcome(
        &self,
        session: &mut QuizSession,
        user: UserId,
    ) -> Result<(), QuizLoopError> {
        let update = session.progress_update()?;

        self.progress
            .record_progress(user, update.level_ordinal, update.status, update.high_score)
            .await?;
        if let Some(next) = update.unlock_ordinal {
            self.progress
                .record_progress(user, next, ProgressStatus::Unlocked, 0)
                .await?;
        }

        session.mark_progress_saved();
        tracing::info!(
            level = update.level_ordinal,
            status = %update.status,
            score = update.high_score,
            "progress update persisted"
        );
        Ok(())
    }
}
