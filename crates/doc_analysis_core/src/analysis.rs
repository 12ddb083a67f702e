//! crates/doc_analysis_core/src/analysis.rs
//!
//! Turns a document body and an analysis request into output text.
//!
//! Four of the seven branches ignore the document entirely and return canned
//! text from the template bank. This is mock-data generation, not inference.

use crate::domain::{AnalysisKind, AnalysisRequest, FaqExample};
use crate::ports::{AnalysisEngine, PortResult};
use crate::templates;
use async_trait::async_trait;

/// The text produced for one analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAnalysis {
    pub content: String,
    pub faq_examples: Vec<FaqExample>,
}

/// Renders the output for `request` against `content`.
pub fn generate(content: &str, request: &AnalysisRequest) -> GeneratedAnalysis {
    let rendered = match request {
        AnalysisRequest::Custom { request } => custom_analysis(content, request),
        AnalysisRequest::Kind(kind) => match kind {
            AnalysisKind::DetailedExplanation => detailed_explanation(content),
            AnalysisKind::Summary => summarize(content),
            AnalysisKind::Highlights => templates::HIGHLIGHTS.join("\n"),
            AnalysisKind::SimplifiedVersion => templates::SIMPLIFIED_VERSION.to_string(),
            AnalysisKind::BulletPointBrief => templates::BULLET_POINTS.join("\n"),
            AnalysisKind::Faqs => templates::FAQ_BLOCK.to_string(),
        },
    };

    GeneratedAnalysis {
        content: rendered,
        faq_examples: templates::faq_examples(),
    }
}

fn detailed_explanation(content: &str) -> String {
    format!(
        "{} {} {}",
        templates::DETAILED_OPENING,
        content,
        templates::DETAILED_CLOSING
    )
}

/// Keeps the first four sentence-like segments of `content`.
///
/// Segments are split on runs of `.`, `!` and `?`; blank segments are dropped.
pub fn summarize(content: &str) -> String {
    let segments: Vec<&str> = sentence_segments(content).take(4).collect();
    format!("{}.", segments.join(". "))
}

fn sentence_segments(content: &str) -> impl Iterator<Item = &str> {
    content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn custom_analysis(content: &str, request: &str) -> String {
    let excerpt: String = content
        .chars()
        .take(templates::CUSTOM_EXCERPT_CHARS)
        .collect();
    format!(
        "Based on your request: \"{}\"\n\nHere's the analysis: {}... {}",
        request,
        excerpt,
        templates::CUSTOM_BOILERPLATE
    )
}

//=========================================================================================
// `AnalysisEngine` Implementation
//=========================================================================================

/// The template-backed analysis engine. Answers immediately; any simulated
/// latency is applied by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct TemplateAnalysisEngine;

impl TemplateAnalysisEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnalysisEngine for TemplateAnalysisEngine {
    async fn analyze(
        &self,
        content: &str,
        request: &AnalysisRequest,
    ) -> PortResult<GeneratedAnalysis> {
        Ok(generate(content, request))
    }
}
