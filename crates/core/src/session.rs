use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::{Level, LevelId, ProgressStatus, ProgressUpdate, Question, QuestionId};

/// Number of incorrect answers that ends an attempt.
pub const MISTAKE_LIMIT: u32 = 3;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("level has no questions")]
    EmptyLevel,

    #[error("session is already finished")]
    Finished,

    #[error("session is not finished yet")]
    NotFinished,
}

//
// ─── OUTCOME & FEEDBACK ────────────────────────────────────────────────────────
//

/// Terminal result of one level attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every question was presented and the mistake limit was never reached.
    Completed { score: u32 },
    /// The mistake limit was reached; the persisted score is forced to zero.
    FailedByMistakes,
}

impl SessionOutcome {
    /// Score this outcome persists as a high-score candidate.
    #[must_use]
    pub fn score(self) -> u32 {
        match self {
            SessionOutcome::Completed { score } => score,
            SessionOutcome::FailedByMistakes => 0,
        }
    }
}

/// What a single submission did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub correct: bool,
    /// Set on the submission that moved the session into a terminal state.
    pub finished: Option<SessionOutcome>,
}

//
// ─── QUIZ SESSION ──────────────────────────────────────────────────────────────
//

/// One in-memory attempt at a level.
///
/// Presents questions in order, scores submitted answers, tracks mistakes
/// and decides when the attempt terminates. Answers are compared to the
/// correct option with exact, case-sensitive equality; a candidate that is
/// not among the options is simply an incorrect answer, not an error.
///
/// Wrong answers advance to the next question rather than re-asking, so
/// the mistake limit gates on count alone.
pub struct QuizSession {
    level_id: LevelId,
    level_ordinal: u32,
    next_ordinal: u32,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    mistakes: u32,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    outcome: Option<SessionOutcome>,
    progress_saved: bool,
}

impl QuizSession {
    /// Start an attempt at question 0 with score and mistakes at zero.
    ///
    /// The level's questions are copied in; the session never observes
    /// later edits to the level.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyLevel` if the level has no questions.
    pub fn start(level: &Level, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if level.question_count() == 0 {
            return Err(SessionError::EmptyLevel);
        }

        Ok(Self {
            level_id: level.id(),
            level_ordinal: level.ordinal(),
            next_ordinal: level.next_ordinal(),
            questions: level.questions().to_vec(),
            current: 0,
            score: 0,
            mistakes: 0,
            started_at,
            finished_at: None,
            outcome: None,
            progress_saved: false,
        })
    }

    #[must_use]
    pub fn level_id(&self) -> LevelId {
        self.level_id
    }

    #[must_use]
    pub fn level_ordinal(&self) -> u32 {
        self.level_ordinal
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    /// Total number of questions in this attempt.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Number of questions already submitted.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.current
    }

    /// Number of questions not yet presented for answering.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.questions.len().saturating_sub(self.current)
    }

    /// The question awaiting an answer, or `None` once terminal.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_finished() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the terminal progress update has been persisted.
    #[must_use]
    pub fn progress_saved(&self) -> bool {
        self.progress_saved
    }

    /// Marks the terminal progress update as persisted. Called by the
    /// orchestration layer after a successful write.
    pub fn mark_progress_saved(&mut self) {
        self.progress_saved = true;
    }

    /// Judge a candidate answer against the current question and advance.
    ///
    /// Correct answers increment the score; incorrect ones (including
    /// candidates that are not options at all) increment the mistake count.
    /// Reaching the mistake limit terminates the attempt as failed even if
    /// the questions were about to run out on the same submission.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finished` if the session is already terminal;
    /// the session state is left untouched.
    pub fn submit_answer(
        &mut self,
        candidate: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerFeedback, SessionError> {
        if self.is_finished() {
            return Err(SessionError::Finished);
        }
        let Some(question) = self.questions.get(self.current) else {
            return Err(SessionError::Finished);
        };
        let question_id = question.id();
        let correct = question.is_correct(candidate);

        if correct {
            self.score += 1;
        } else {
            self.mistakes += 1;
        }

        // Mistake limit wins over question exhaustion.
        if self.mistakes >= MISTAKE_LIMIT {
            self.finish(SessionOutcome::FailedByMistakes, answered_at);
        } else {
            self.current += 1;
            if self.current >= self.questions.len() {
                self.finish(SessionOutcome::Completed { score: self.score }, answered_at);
            }
        }

        Ok(AnswerFeedback {
            question_id,
            correct,
            finished: self.outcome,
        })
    }

    /// Terminal result of the attempt. Repeated calls return the same value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while the session is live.
    pub fn outcome(&self) -> Result<SessionOutcome, SessionError> {
        self.outcome.ok_or(SessionError::NotFinished)
    }

    /// Builds the single progress-update intent for this attempt.
    ///
    /// Completed attempts mark the level completed with the final score and
    /// request an unlock of the following ordinal; failed attempts leave the
    /// level unlocked with a zero score candidate.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while the session is live.
    pub fn progress_update(&self) -> Result<ProgressUpdate, SessionError> {
        let outcome = self.outcome()?;
        let update = match outcome {
            SessionOutcome::Completed { score } => ProgressUpdate {
                level_ordinal: self.level_ordinal,
                status: ProgressStatus::Completed,
                high_score: score,
                unlock_ordinal: Some(self.next_ordinal),
            },
            SessionOutcome::FailedByMistakes => ProgressUpdate {
                level_ordinal: self.level_ordinal,
                status: ProgressStatus::Unlocked,
                high_score: 0,
                unlock_ordinal: None,
            },
        };
        Ok(update)
    }

    fn finish(&mut self, outcome: SessionOutcome, at: DateTime<Utc>) {
        self.outcome = Some(outcome);
        self.finished_at = Some(at);
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("level_id", &self.level_id)
            .field("level_ordinal", &self.level_ordinal)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("mistakes", &self.mistakes)
            .field("outcome", &self.outcome)
            .field("progress_saved", &self.progress_saved)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            None,
            vec!["right".into(), "wrong".into()],
            "right",
        )
        .unwrap()
    }

    fn build_level(question_count: u64) -> Level {
        let questions = (1..=question_count).map(build_question).collect();
        Level::new(LevelId::new(1), 1, "Test", questions, fixed_now()).unwrap()
    }

    #[test]
    fn empty_level_cannot_start() {
        let level = Level::new(LevelId::new(1), 1, "Empty", Vec::new(), fixed_now()).unwrap();
        let err = QuizSession::start(&level, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::EmptyLevel));
    }

    #[test]
    fn all_correct_completes_with_full_score() {
        let level = build_level(5);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();

        for _ in 0..5 {
            session.submit_answer("right", fixed_now()).unwrap();
        }

        assert!(session.is_finished());
        assert_eq!(
            session.outcome().unwrap(),
            SessionOutcome::Completed { score: 5 }
        );
        assert_eq!(session.finished_at(), Some(fixed_now()));
    }

    #[test]
    fn three_wrong_answers_fail_with_zero_score() {
        let level = build_level(5);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();

        session.submit_answer("wrong", fixed_now()).unwrap();
        session.submit_answer("wrong", fixed_now()).unwrap();
        session.submit_answer("right", fixed_now()).unwrap();
        let feedback = session.submit_answer("wrong", fixed_now()).unwrap();

        assert_eq!(feedback.finished, Some(SessionOutcome::FailedByMistakes));
        assert_eq!(session.outcome().unwrap(), SessionOutcome::FailedByMistakes);
        // One answer was correct, but a failed attempt persists zero.
        assert_eq!(session.outcome().unwrap().score(), 0);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn mistake_limit_wins_over_question_exhaustion() {
        // Three questions, three wrong answers: the third submission would
        // also exhaust the level, but the failure takes precedence.
        let level = build_level(3);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();

        for _ in 0..3 {
            session.submit_answer("wrong", fixed_now()).unwrap();
        }

        assert_eq!(session.outcome().unwrap(), SessionOutcome::FailedByMistakes);
    }

    #[test]
    fn wrong_answers_advance_instead_of_reasking() {
        let level = build_level(3);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();

        let first_id = session.current_question().unwrap().id();
        session.submit_answer("wrong", fixed_now()).unwrap();
        let second_id = session.current_question().unwrap().id();
        assert_ne!(first_id, second_id);
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.remaining(), 2);
    }

    #[test]
    fn mixed_answers_complete_when_under_mistake_limit() {
        let level = build_level(5);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();

        for answer in ["wrong", "right", "wrong", "right", "right"] {
            session.submit_answer(answer, fixed_now()).unwrap();
        }

        assert_eq!(
            session.outcome().unwrap(),
            SessionOutcome::Completed { score: 3 }
        );
        assert_eq!(session.mistakes(), 2);
    }

    #[test]
    fn candidate_outside_options_counts_as_incorrect() {
        let level = build_level(2);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();

        let feedback = session.submit_answer("banana", fixed_now()).unwrap();
        assert!(!feedback.correct);
        assert_eq!(session.mistakes(), 1);
    }

    #[test]
    fn answer_comparison_is_case_sensitive() {
        let level = build_level(2);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();

        let feedback = session.submit_answer("RIGHT", fixed_now()).unwrap();
        assert!(!feedback.correct);
    }

    #[test]
    fn terminal_session_rejects_further_submissions() {
        let level = build_level(1);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();
        session.submit_answer("right", fixed_now()).unwrap();

        let err = session.submit_answer("right", fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Finished));
        assert_eq!(
            session.outcome().unwrap(),
            SessionOutcome::Completed { score: 1 }
        );
        assert!(session.current_question().is_none());
    }

    #[test]
    fn outcome_is_idempotent() {
        let level = build_level(2);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();
        session.submit_answer("right", fixed_now()).unwrap();
        session.submit_answer("right", fixed_now()).unwrap();

        let first = session.outcome().unwrap();
        let second = session.outcome().unwrap();
        assert_eq!(first, second);
        assert_eq!(session.score(), 2);
    }

    #[test]
    fn outcome_unreadable_before_terminal() {
        let level = build_level(2);
        let session = QuizSession::start(&level, fixed_now()).unwrap();
        assert!(matches!(session.outcome(), Err(SessionError::NotFinished)));
        assert!(matches!(
            session.progress_update(),
            Err(SessionError::NotFinished)
        ));
    }

    #[test]
    fn completed_update_unlocks_next_ordinal() {
        let level = build_level(2);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();
        session.submit_answer("right", fixed_now()).unwrap();
        session.submit_answer("right", fixed_now()).unwrap();

        let update = session.progress_update().unwrap();
        assert_eq!(update.status, ProgressStatus::Completed);
        assert_eq!(update.high_score, 2);
        assert_eq!(update.unlock_ordinal, Some(2));
    }

    #[test]
    fn unlock_ordinal_saturates_at_the_ceiling() {
        let level = Level::new(
            LevelId::new(1),
            u32::MAX,
            "Last",
            vec![build_question(1)],
            fixed_now(),
        )
        .unwrap();
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();
        session.submit_answer("right", fixed_now()).unwrap();

        let update = session.progress_update().unwrap();
        assert_eq!(update.unlock_ordinal, Some(u32::MAX));
    }

    #[test]
    fn failed_update_keeps_level_unlocked_without_unlock() {
        let level = build_level(5);
        let mut session = QuizSession::start(&level, fixed_now()).unwrap();
        for _ in 0..3 {
            session.submit_answer("wrong", fixed_now()).unwrap();
        }

        let update = session.progress_update().unwrap();
        assert_eq!(update.status, ProgressStatus::Unlocked);
        assert_eq!(update.high_score, 0);
        assert!(update.unlock_ordinal.is_none());
    }
}
