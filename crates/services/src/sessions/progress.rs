use quiz_core::session::QuizSession;

/// Aggregated view of session progress, useful for renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: u32,
    pub mistakes: u32,
    pub is_finished: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &QuizSession) -> Self {
        Self {
            total: session.total_questions(),
            answered: session.answered_count(),
            remaining: session.remaining(),
            score: session.score(),
            mistakes: session.mistakes(),
            is_finished: session.is_finished(),
        }
    }
}
