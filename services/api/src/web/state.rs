//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the in-memory session store.

use crate::{
    adapters::{tts::parse_voice, OpenAiQaAdapter, OpenAiTtsAdapter, SilentTtsAdapter},
    config::{Config, ConfigError, QaBackend},
    error::ApiError,
};
use async_openai::{config::OpenAIConfig, types::audio::SpeechModel, Client};
use doc_analysis_core::{
    analysis::TemplateAnalysisEngine,
    followup::{CannedAnswerService, FollowUpDesk},
    pipeline::DocumentPipeline,
    ports::{QuestionAnsweringService, TextToSpeechService},
    upload::SampleContentExtractor,
    CoreError, CoreResult, Session,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub pipeline: DocumentPipeline,
    pub follow_up: FollowUpDesk,
    pub tts_adapter: Arc<dyn TextToSpeechService>,
}

impl AppState {
    /// Wires up every adapter the configuration asks for.
    ///
    /// Without an OpenAI key, speech is silent and follow-up questions get the
    /// canned answers.
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let openai_client = config
            .openai_api_key
            .as_ref()
            .map(|key| Client::with_config(OpenAIConfig::new().with_api_key(key)));

        let tts_adapter: Arc<dyn TextToSpeechService> = match &openai_client {
            Some(client) => {
                let voice = parse_voice(&config.tts_voice).ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "TTS_VOICE".to_string(),
                        format!("'{}' is not a supported voice", config.tts_voice),
                    )
                })?;
                Arc::new(OpenAiTtsAdapter::new(
                    client.clone(),
                    SpeechModel::Tts1Hd,
                    voice,
                ))
            }
            None => {
                info!("OPENAI_API_KEY not set; speech synthesis is silent.");
                Arc::new(SilentTtsAdapter)
            }
        };

        let qa_adapter: Arc<dyn QuestionAnsweringService> =
            match (config.qa_backend, &openai_client) {
                (QaBackend::OpenAi, Some(client)) => Arc::new(OpenAiQaAdapter::new(
                    client.clone(),
                    config.qa_model.clone(),
                )),
                (QaBackend::OpenAi, None) => {
                    return Err(ConfigError::MissingVar("OPENAI_API_KEY".to_string()).into())
                }
                (QaBackend::Canned, _) => Arc::new(CannedAnswerService::new()),
            };

        let pipeline = DocumentPipeline::new(
            Arc::new(SampleContentExtractor::new()),
            Arc::new(TemplateAnalysisEngine::new()),
            config.latency,
        );

        Ok(Self {
            config: Arc::new(config),
            sessions: SessionStore::new(),
            pipeline,
            follow_up: FollowUpDesk::new(qa_adapter),
            tts_adapter,
        })
    }
}

//=========================================================================================
// SessionStore (One Entry Per Analysis Session)
//=========================================================================================

/// A live analysis session and the token that cancels its pending work.
#[derive(Clone)]
pub struct SessionHandle {
    pub state: Arc<Mutex<Session>>,
    pub cancellation_token: CancellationToken,
}

/// Sessions live only in memory and vanish with the process.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let session = Session::new();
        let id = session.id;
        let handle = SessionHandle {
            state: Arc::new(Mutex::new(session)),
            cancellation_token: CancellationToken::new(),
        };
        self.sessions.write().await.insert(id, handle.clone());
        info!("Created analysis session {}", id);
        (id, handle)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound("Session", id))
    }

    /// Removes the session and cancels anything still running against it.
    pub async fn close(&self, id: Uuid) -> CoreResult<()> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(CoreError::NotFound("Session", id))?;
        handle.cancellation_token.cancel();
        info!("Closed analysis session {}", id);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds_offline_state() {
        let state = AppState::new(Config::default()).unwrap();
        assert_eq!(state.config.qa_backend, QaBackend::Canned);
    }

    #[test]
    fn test_openai_backend_without_key_is_rejected() {
        let config = Config {
            qa_backend: QaBackend::OpenAi,
            ..Config::default()
        };
        assert!(matches!(AppState::new(config), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_unknown_voice_is_rejected_when_speech_is_enabled() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            tts_voice: "robot".to_string(),
            ..Config::default()
        };
        assert!(AppState::new(config).is_err());
    }

    #[tokio::test]
    async fn test_create_get_close() {
        let store = SessionStore::new();
        let (id, handle) = store.create().await;
        assert_eq!(handle.state.lock().await.id, id);
        assert!(store.get(id).await.is_ok());
        assert_eq!(store.len().await, 1);

        store.close(id).await.unwrap();
        assert!(handle.cancellation_token.is_cancelled());
        assert!(matches!(
            store.get(id).await,
            Err(CoreError::NotFound("Session", _))
        ));
        assert!(store.close(id).await.is_err());
        assert!(store.is_empty().await);
    }
}
