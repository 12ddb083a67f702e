//! crates/doc_analysis_core/src/followup.rs
//!
//! Follow-up questions about an analysis result.

use crate::domain::{AnalysisResult, ConversationEntry};
use crate::error::{CoreError, CoreResult};
use crate::ports::{PortResult, QuestionAnsweringService};
use crate::session::Session;
use crate::templates;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

/// Routes follow-up questions to a `QuestionAnsweringService` and records the
/// exchange on the result's conversation history.
///
/// Only one question per result may be in flight; a second submission is
/// refused with `CoreError::Busy` until the first resolves or fails.
#[derive(Clone)]
pub struct FollowUpDesk {
    qa: Arc<dyn QuestionAnsweringService>,
}

impl FollowUpDesk {
    pub fn new(qa: Arc<dyn QuestionAnsweringService>) -> Self {
        Self { qa }
    }

    pub async fn ask(
        &self,
        session: &Mutex<Session>,
        analysis_id: Uuid,
        question: &str,
    ) -> CoreResult<ConversationEntry> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CoreError::EmptyInput("Question"));
        }

        let context = {
            let mut session = session.lock().await;
            let context = build_context(session.analysis(analysis_id)?);
            session.begin_question(analysis_id)?;
            context
        };

        let outcome = self.qa.answer_question(question, &context).await;

        let mut session = session.lock().await;
        session.end_question(analysis_id);
        let answer = outcome.map_err(|e| {
            error!(
                "Follow-up question failed for analysis {}: {}",
                analysis_id, e
            );
            CoreError::from(e)
        })?;

        let entry = ConversationEntry {
            id: Uuid::new_v4(),
            question: question.to_string(),
            answer,
            asked_at: Utc::now(),
        };
        session.append_conversation(analysis_id, entry.clone())?;
        info!("Answered follow-up question for analysis {}", analysis_id);
        Ok(entry)
    }
}

/// The result text plus the most recent exchange, if any.
fn build_context(result: &AnalysisResult) -> String {
    let analysis_context = format!(
        "ANALYSIS ({}) OF {}:\n{}",
        result.output_kind, result.file_name, result.content
    );
    match result.conversation.last() {
        Some(previous) => format!(
            "{}\n\nPREVIOUS Q&A:\nQ: {}\nA: {}",
            analysis_context, previous.question, previous.answer
        ),
        None => analysis_context,
    }
}

//=========================================================================================
// `QuestionAnsweringService` Implementation
//=========================================================================================

/// Acknowledges every question with a canned reply.
#[derive(Debug, Clone, Default)]
pub struct CannedAnswerService;

impl CannedAnswerService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QuestionAnsweringService for CannedAnswerService {
    async fn answer_question(&self, question: &str, _context: &str) -> PortResult<String> {
        Ok(templates::canned_follow_up_answer(question))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalysisKind, OutputKind};
    use crate::ports::PortError;
    use tokio::sync::Notify;

    fn session_with_result() -> (Mutex<Session>, Uuid) {
        let mut session = Session::new();
        let result = AnalysisResult {
            id: Uuid::new_v4(),
            file_name: "notes.txt".to_string(),
            output_kind: OutputKind::Analysis(AnalysisKind::Summary),
            content: "Solar is cheap.".to_string(),
            faq_examples: Vec::new(),
            created_at: Utc::now(),
            conversation: Vec::new(),
        };
        let id = result.id;
        session.add_analysis(result);
        (Mutex::new(session), id)
    }

    struct FailingService;

    #[async_trait]
    impl QuestionAnsweringService for FailingService {
        async fn answer_question(&self, _q: &str, _c: &str) -> PortResult<String> {
            Err(PortError::Unexpected("model offline".to_string()))
        }
    }

    /// Blocks until released, so a question can be held "in flight".
    struct GatedService {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl QuestionAnsweringService for GatedService {
        async fn answer_question(&self, question: &str, context: &str) -> PortResult<String> {
            self.gate.notified().await;
            Ok(format!("{question} | {}", context.lines().count()))
        }
    }

    #[tokio::test]
    async fn test_answer_is_appended_to_history() {
        let (session, id) = session_with_result();
        let desk = FollowUpDesk::new(Arc::new(CannedAnswerService::new()));

        let entry = desk.ask(&session, id, "  Is solar cheap?  ").await.unwrap();
        assert_eq!(entry.question, "Is solar cheap?");
        assert!(entry.answer.contains("Is solar cheap?"));

        let session = session.lock().await;
        let result = session.analysis(id).unwrap();
        assert_eq!(result.conversation, vec![entry]);
        assert!(!session.is_answering(id));
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let (session, id) = session_with_result();
        let desk = FollowUpDesk::new(Arc::new(CannedAnswerService::new()));
        let err = desk.ask(&session, id, "   ").await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyInput(_)));
    }

    #[tokio::test]
    async fn test_failure_releases_lock_without_state_change() {
        let (session, id) = session_with_result();
        let desk = FollowUpDesk::new(Arc::new(FailingService));

        let err = desk.ask(&session, id, "Why?").await.unwrap_err();
        assert!(matches!(err, CoreError::Port(_)));

        let session = session.lock().await;
        assert!(session.analysis(id).unwrap().conversation.is_empty());
        assert!(!session.is_answering(id));
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_rejected() {
        let (session, id) = session_with_result();
        let session = Arc::new(session);
        let gate = Arc::new(Notify::new());
        let desk = FollowUpDesk::new(Arc::new(GatedService { gate: gate.clone() }));

        let first = {
            let desk = desk.clone();
            let session = session.clone();
            tokio::spawn(async move { desk.ask(&session, id, "First?").await })
        };
        while !session.lock().await.is_answering(id) {
            tokio::task::yield_now().await;
        }

        let second = desk.ask(&session, id, "Second?").await;
        assert!(matches!(second, Err(CoreError::Busy(_))));

        gate.notify_one();
        let entry = first.await.unwrap().unwrap();
        assert_eq!(entry.question, "First?");
        assert_eq!(session.lock().await.analysis(id).unwrap().conversation.len(), 1);
    }

    #[tokio::test]
    async fn test_context_includes_previous_exchange() {
        let (session, id) = session_with_result();
        let desk = FollowUpDesk::new(Arc::new(CannedAnswerService::new()));
        desk.ask(&session, id, "One?").await.unwrap();

        let guard = session.lock().await;
        let context = build_context(guard.analysis(id).unwrap());
        assert!(context.starts_with("ANALYSIS (Summary) OF notes.txt:\nSolar is cheap."));
        assert!(context.contains("PREVIOUS Q&A:\nQ: One?"));
    }

    #[tokio::test]
    async fn test_unknown_analysis() {
        let (session, _) = session_with_result();
        let desk = FollowUpDesk::new(Arc::new(CannedAnswerService::new()));
        let err = desk.ask(&session, Uuid::new_v4(), "Hm?").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("Analysis", _)));
    }
}
