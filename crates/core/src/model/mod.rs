mod ids;
mod level;
mod progress;
mod question;

pub use ids::{LevelId, ParseIdError, QuestionId, UserId};
pub use level::{Level, LevelError};
pub use progress::{ProgressRecord, ProgressStatus, ProgressStatusError, ProgressUpdate};
pub use question::{ImageRef, Question, QuestionError};
