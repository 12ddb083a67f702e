//! services/api/src/adapters/qa_llm.rs
//!
//! This module contains the adapter for answering follow-up questions with an
//! OpenAI chat model. It implements the `QuestionAnsweringService` port from the
//! `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use doc_analysis_core::ports::{PortError, PortResult, QuestionAnsweringService};
use tracing::debug;

const SYSTEM_INSTRUCTIONS: &str = r#"You are a helpful assistant answering follow-up questions about a document analysis.

The context you receive contains:
- ANALYSIS: the generated analysis the user is looking at.
- PREVIOUS Q&A: optionally, the user's last question and your last answer.

Answer in a few clear sentences. Use the analysis when it helps. If the analysis does not contain the detail asked for, say so plainly instead of guessing."#;

/// An adapter that implements `QuestionAnsweringService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQaAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQaAdapter {
    /// Creates a new `OpenAiQaAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Context and question are inserted verbatim; neither is scanned for
/// placeholders.
fn render_prompt(question: &str, context: &str) -> String {
    format!(
        "CONTEXT:\n---\n{}\n---\n\nQUESTION:\n{}",
        context, question
    )
}

#[async_trait]
impl QuestionAnsweringService for OpenAiQaAdapter {
    async fn answer_question(&self, question: &str, context: &str) -> PortResult<String> {
        debug!("Asking {} a follow-up question", self.model);

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_INSTRUCTIONS)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(render_prompt(question, context))
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(400u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let answer = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| PortError::Unexpected("No answer generated".to_string()))?;

        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_question_and_context() {
        let prompt = render_prompt("Why?", "ANALYSIS (Summary) OF a.txt:\nBody.");
        assert!(prompt.contains("---\nANALYSIS (Summary) OF a.txt:\nBody.\n---"));
        assert!(prompt.ends_with("QUESTION:\nWhy?"));
    }

    #[test]
    fn test_placeholder_text_in_context_is_left_alone() {
        let prompt = render_prompt("What is due?", "A: literally {question} and {context}");
        assert!(prompt.contains("---\nA: literally {question} and {context}\n---"));
        assert!(prompt.ends_with("QUESTION:\nWhat is due?"));
    }
}
