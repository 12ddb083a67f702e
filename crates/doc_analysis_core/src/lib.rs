pub mod analysis;
pub mod audio;
pub mod domain;
pub mod error;
pub mod followup;
pub mod pipeline;
pub mod playback;
pub mod ports;
pub mod session;
pub mod task;
pub mod templates;
pub mod upload;

pub use domain::{
    AnalysisKind, AnalysisRequest, AnalysisResult, ConversationEntry, Document, FaqExample,
    OutputKind,
};
pub use error::{CoreError, CoreResult};
pub use ports::{
    AnalysisEngine, ContentExtractor, PortError, PortResult, QuestionAnsweringService,
    SpeechEngine, SpeechEvent, SpeechEventStream, TextToSpeechService, Utterance,
};
pub use session::{Session, SessionView};
