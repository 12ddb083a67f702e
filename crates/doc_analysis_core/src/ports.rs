//! crates/doc_analysis_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of browsers, speech engines and language models.

use crate::analysis::GeneratedAnalysis;
use crate::domain::AnalysisRequest;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, audio).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Document Ports
//=========================================================================================

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Produces the text content for an accepted upload.
    async fn extract(&self, file_name: &str) -> PortResult<String>;
}

#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Produces the analysis text and example questions for a document body.
    async fn analyze(
        &self,
        content: &str,
        request: &AnalysisRequest,
    ) -> PortResult<GeneratedAnalysis>;
}

#[async_trait]
pub trait QuestionAnsweringService: Send + Sync {
    /// Answers a question based on a provided context.
    async fn answer_question(&self, question: &str, context: &str) -> PortResult<String>;
}

//=========================================================================================
// Speech Ports
//=========================================================================================

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates audio data from a string of text.
    async fn generate_audio(&self, text: &str) -> PortResult<Vec<u8>>;
}

/// Read-aloud speaks slightly slower than normal speech.
pub const READ_ALOUD_RATE: f32 = 0.9;

/// A request to speak some text aloud.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: READ_ALOUD_RATE,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Lifecycle callbacks reported by a speech engine for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    Ended,
    Error(String),
}

pub type SpeechEventStream = Pin<Box<dyn Stream<Item = SpeechEvent> + Send>>;

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Starts speaking the utterance. The returned stream yields `Started`
    /// and then exactly one of `Ended` or `Error`.
    async fn speak(&self, utterance: Utterance) -> PortResult<SpeechEventStream>;

    /// Cancels whatever is currently being spoken. Safe to call when idle.
    fn cancel(&self);
}
