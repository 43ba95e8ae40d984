#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;
pub mod speech;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuizLoopError, SpeechError};
pub use sessions::{AnswerOutcome, QuizLoopService, SessionProgress, SpokenOutcome};
pub use speech::{DisabledSpeech, HttpTranscriber, SpeechConfig, SpeechPlayback, Transcriber};
