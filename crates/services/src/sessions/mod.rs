mod progress;
mod queries;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::QuizLoopError;
pub use progress::SessionProgress;
pub use workflow::{AnswerOutcome, QuizLoopService, SpokenOutcome};
