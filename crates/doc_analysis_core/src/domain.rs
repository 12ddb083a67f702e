//! crates/doc_analysis_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Represents a document uploaded into an analysis session.
///
/// The content is placeholder text produced by a `ContentExtractor`, not the
/// decoded bytes of the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: Uuid,
    pub file_name: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A fixed example question shown alongside every analysis result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqExample {
    pub question: String,
    pub answer: String,
}

/// A single follow-up question and its answer, attached to an analysis result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// The output of applying one analysis kind to a document.
///
/// Everything except `conversation` is fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub id: Uuid,
    /// Copied from the originating document, not a live reference.
    pub file_name: String,
    pub output_kind: OutputKind,
    pub content: String,
    pub faq_examples: Vec<FaqExample>,
    pub created_at: DateTime<Utc>,
    pub conversation: Vec<ConversationEntry>,
}

//=========================================================================================
// Analysis Kinds
//=========================================================================================

/// The six canned analyses a user can pick for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    DetailedExplanation,
    Summary,
    Highlights,
    SimplifiedVersion,
    BulletPointBrief,
    Faqs,
}

impl AnalysisKind {
    /// Every kind in the order the options are presented.
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::DetailedExplanation,
        AnalysisKind::Summary,
        AnalysisKind::Highlights,
        AnalysisKind::SimplifiedVersion,
        AnalysisKind::BulletPointBrief,
        AnalysisKind::Faqs,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisKind::DetailedExplanation => "Detailed Explanation",
            AnalysisKind::Summary => "Summary",
            AnalysisKind::Highlights => "Highlights / Key Aspects",
            AnalysisKind::SimplifiedVersion => "Simplified Version",
            AnalysisKind::BulletPointBrief => "Bullet-Point Brief",
            AnalysisKind::Faqs => "Frequently Asked Questions (FAQs)",
        }
    }

    /// A one-line description of what the analysis produces.
    pub fn description(self) -> &'static str {
        match self {
            AnalysisKind::DetailedExplanation => {
                "Comprehensive analysis covering all main points and details"
            }
            AnalysisKind::Summary => "Well-structured summary with key points and conclusions",
            AnalysisKind::Highlights => "Extract only the most important insights and highlights",
            AnalysisKind::SimplifiedVersion => "Plain language version suitable for all audiences",
            AnalysisKind::BulletPointBrief => "Concise bullet points capturing key ideas",
            AnalysisKind::Faqs => "Common questions and answers about the document",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a label does not name a known analysis kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown analysis kind: '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for AnalysisKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.label() == trimmed)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// The kind recorded on a finished result: one of the fixed analyses, or a
/// custom request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Analysis(AnalysisKind),
    CustomRequest,
}

impl OutputKind {
    pub fn label(self) -> &'static str {
        match self {
            OutputKind::Analysis(kind) => kind.label(),
            OutputKind::CustomRequest => "Custom Request",
        }
    }
}

impl From<AnalysisKind> for OutputKind {
    fn from(kind: AnalysisKind) -> Self {
        OutputKind::Analysis(kind)
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == OutputKind::CustomRequest.label() {
            return Ok(OutputKind::CustomRequest);
        }
        s.parse::<AnalysisKind>().map(OutputKind::Analysis)
    }
}

/// What the user asked for: a fixed analysis, or free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    Kind(AnalysisKind),
    Custom { request: String },
}

impl AnalysisRequest {
    pub fn output_kind(&self) -> OutputKind {
        match self {
            AnalysisRequest::Kind(kind) => OutputKind::Analysis(*kind),
            AnalysisRequest::Custom { .. } => OutputKind::CustomRequest,
        }
    }
}
