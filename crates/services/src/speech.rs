//! Speech collaborator contracts: capture (transcription) and playback.
//!
//! Both are external to the session state machine; it only consumes a
//! resolved utterance string and never waits on capture itself. Missing
//! speech support is a queryable capability, not an exception.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::SpeechError;

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Turns captured audio into an utterance string.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Whether transcription is available in this runtime.
    fn is_supported(&self) -> bool;

    /// Transcribe raw audio bytes.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Unsupported` when no backend is configured,
    /// `SpeechError::EmptyTranscript` when the backend heard nothing, or a
    /// transport error.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, SpeechError>;
}

/// Reads question text aloud. Failures are non-fatal to a session.
#[async_trait]
pub trait SpeechPlayback: Send + Sync {
    /// Whether playback is available in this runtime.
    fn is_supported(&self) -> bool;

    /// Play the given text.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` when playback is unavailable or fails.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// Stand-in for runtimes without any speech support.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSpeech;

#[async_trait]
impl Transcriber for DisabledSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> Result<String, SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

#[async_trait]
impl SpeechPlayback for DisabledSpeech {
    fn is_supported(&self) -> bool {
        false
    }

    async fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }
}

//
// ─── HTTP TRANSCRIBER ──────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl SpeechConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_SPEECH_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("QUIZ_SPEECH_BASE_URL")
            .unwrap_or_else(|_| "https://api.deepgram.com/v1".into());
        let model = env::var("QUIZ_SPEECH_MODEL").unwrap_or_else(|_| "nova-2".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Transcriber backed by a Deepgram-style `/listen` endpoint that accepts
/// raw audio in the request body.
#[derive(Clone)]
pub struct HttpTranscriber {
    client: Client,
    config: Option<SpeechConfig>,
}

impl HttpTranscriber {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SpeechConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<SpeechConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    fn is_supported(&self) -> bool {
        self.config.is_some()
    }

    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, SpeechError> {
        let config = self.config.as_ref().ok_or(SpeechError::Unsupported)?;

        let url = format!("{}/listen", config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .query(&[("model", config.model.as_str()), ("smart_format", "true")])
            .header("Authorization", format!("Token {}", config.api_key))
            .header("Content-Type", mime_type)
            .body(audio.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SpeechError::HttpStatus(response.status()));
        }

        let body: ListenResponse = response.json().await?;
        let transcript = body
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|channel| channel.alternatives.into_iter().next())
            .map(|alternative| alternative.transcript)
            .unwrap_or_default();

        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(SpeechError::EmptyTranscript);
        }
        Ok(transcript)
    }
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: String,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_speech_reports_unsupported() {
        let speech = DisabledSpeech;
        assert!(!Transcriber::is_supported(&speech));
        assert!(!SpeechPlayback::is_supported(&speech));

        let err = speech.transcribe(b"audio", "audio/wav").await.unwrap_err();
        assert!(matches!(err, SpeechError::Unsupported));
        let err = speech.speak("hello").await.unwrap_err();
        assert!(matches!(err, SpeechError::Unsupported));
    }

    #[tokio::test]
    async fn unconfigured_transcriber_is_unsupported() {
        let transcriber = HttpTranscriber::new(None);
        assert!(!transcriber.is_supported());

        let err = transcriber
            .transcribe(b"audio", "audio/wav")
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Unsupported));
    }

    #[test]
    fn configured_transcriber_is_supported() {
        let transcriber = HttpTranscriber::new(Some(SpeechConfig {
            base_url: "https://api.deepgram.com/v1".into(),
            api_key: "key".into(),
            model: "nova-2".into(),
        }));
        assert!(transcriber.is_supported());
    }
}
