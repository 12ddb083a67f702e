pub mod qa_llm;
pub mod speech;
pub mod tts;

pub use qa_llm::OpenAiQaAdapter;
pub use speech::StreamingSpeechEngine;
pub use tts::{OpenAiTtsAdapter, SilentTtsAdapter};
