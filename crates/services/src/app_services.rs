use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::QuizLoopService;
use crate::speech::{DisabledSpeech, HttpTranscriber, SpeechPlayback, Transcriber};

/// Assembles the quiz services over a storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_loop: Arc<QuizLoopService>,
    transcriber: Arc<dyn Transcriber>,
    storage: Storage,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Transcription is configured from the environment when available;
    /// playback stays disabled unless provided via `with_playback`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(storage, clock))
    }

    /// Build services over in-memory storage, for tests and prototyping.
    #[must_use]
    pub fn new_in_memory(clock: Clock) -> Self {
        Self::assemble(Storage::in_memory(), clock)
    }

    fn assemble(storage: Storage, clock: Clock) -> Self {
        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            Arc::clone(&storage.levels),
            Arc::clone(&storage.progress),
        ));
        let transcriber: Arc<dyn Transcriber> = {
            let http = HttpTranscriber::from_env();
            if http.is_supported() {
                Arc::new(http)
            } else {
                Arc::new(DisabledSpeech)
            }
        };

        Self {
            quiz_loop,
            transcriber,
            storage,
        }
    }

    /// Route question playback through the given collaborator.
    #[must_use]
    pub fn with_playback(mut self, playback: Arc<dyn SpeechPlayback>) -> Self {
        let quiz_loop = QuizLoopService::clone(&self.quiz_loop).with_playback(playback);
        self.quiz_loop = Arc::new(quiz_loop);
        self
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    #[must_use]
    pub fn transcriber(&self) -> Arc<dyn Transcriber> {
        Arc::clone(&self.transcriber)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}
