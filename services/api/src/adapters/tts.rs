//! services/api/src/adapters/tts.rs
//!
//! Text-to-speech adapters implementing the `TextToSpeechService` port from the
//! `core` crate: OpenAI's speech API, and a silent fallback for running without
//! an API key.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{CreateSpeechRequest, SpeechModel, Voice},
    Client,
};
use async_trait::async_trait;
use doc_analysis_core::ports::{PortError, PortResult, TextToSpeechService, READ_ALOUD_RATE};
use tracing::debug;

//=========================================================================================
// OpenAI Adapter
//=========================================================================================

/// Reads audio scripts aloud through OpenAI's speech endpoint, at the
/// read-aloud rate unless told otherwise.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
    speed: f32,
}

impl OpenAiTtsAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: SpeechModel, voice: Voice) -> Self {
        Self {
            client,
            model,
            voice,
            speed: READ_ALOUD_RATE,
        }
    }

    /// Overrides the playback speed (OpenAI accepts 0.25 to 4.0).
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.clamp(0.25, 4.0);
        self
    }

    fn speech_request(&self, script: &str) -> CreateSpeechRequest {
        CreateSpeechRequest {
            model: self.model.clone(),
            input: script.to_string(),
            voice: self.voice.clone(),
            speed: Some(self.speed),
            ..Default::default()
        }
    }
}

/// Maps a configured voice name onto the OpenAI voice.
pub fn parse_voice(name: &str) -> Option<Voice> {
    match name.to_lowercase().as_str() {
        "alloy" => Some(Voice::Alloy),
        "echo" => Some(Voice::Echo),
        "fable" => Some(Voice::Fable),
        "onyx" => Some(Voice::Onyx),
        "nova" => Some(Voice::Nova),
        "shimmer" => Some(Voice::Shimmer),
        _ => None,
    }
}

#[async_trait]
impl TextToSpeechService for OpenAiTtsAdapter {
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>> {
        let script = text.trim();
        if script.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            "Synthesizing {} characters of audio script at {}x",
            script.chars().count(),
            self.speed
        );

        let response = self
            .client
            .audio()
            .speech(self.speech_request(script))
            .await
            .map_err(|e: OpenAIError| {
                PortError::Unexpected(format!("Speech synthesis failed: {}", e))
            })?;

        Ok(response.bytes.to_vec())
    }
}

//=========================================================================================
// Silent Adapter
//=========================================================================================

/// Produces no audio at all. Playback still runs its full lifecycle, which
/// keeps the read-aloud flow usable without credentials.
#[derive(Clone, Debug, Default)]
pub struct SilentTtsAdapter;

#[async_trait]
impl TextToSpeechService for SilentTtsAdapter {
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>> {
        debug!("Silent TTS skipping {} characters", text.len());
        Ok(Vec::new())
    }
}
