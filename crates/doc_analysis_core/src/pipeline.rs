//! crates/doc_analysis_core/src/pipeline.rs
//!
//! The upload → analyze → audio-script pipeline. Each operation validates
//! against the session, waits out its simulated latency, calls the relevant
//! port and publishes the outcome back into the session.
//!
//! The session lock is never held across a delay or a port call, and every
//! in-flight flag is cleared on every exit path.

use crate::audio;
use crate::domain::{AnalysisRequest, AnalysisResult, Document};
use crate::error::{CoreError, CoreResult};
use crate::ports::{AnalysisEngine, ContentExtractor};
use crate::session::Session;
use crate::task::{run_cancellable, simulate_latency};
use crate::upload::{self, FileSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Artificial processing delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub upload: Duration,
    pub analysis: Duration,
    pub audio_script: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            upload: Duration::from_millis(1500),
            analysis: Duration::from_millis(2000),
            audio_script: Duration::from_millis(1500),
        }
    }
}

impl Latency {
    /// No artificial delay at all.
    pub fn none() -> Self {
        Self {
            upload: Duration::ZERO,
            analysis: Duration::ZERO,
            audio_script: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
pub struct DocumentPipeline {
    extractor: Arc<dyn ContentExtractor>,
    engine: Arc<dyn AnalysisEngine>,
    latency: Latency,
}

impl DocumentPipeline {
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        engine: Arc<dyn AnalysisEngine>,
        latency: Latency,
    ) -> Self {
        Self {
            extractor,
            engine,
            latency,
        }
    }

    pub fn latency(&self) -> Latency {
        self.latency
    }

    /// Validates and ingests a file. On success the new document is the
    /// newest and current one, and no analysis is current.
    pub async fn upload(
        &self,
        session: &Mutex<Session>,
        file: &dyn FileSource,
        token: &CancellationToken,
    ) -> CoreResult<Document> {
        if let Err(e) = upload::validate(file) {
            warn!("Rejected upload '{}': {}", file.file_name(), e);
            return Err(e.into());
        }

        session.lock().await.begin_upload()?;
        let outcome = self.extract_document(file.file_name(), token).await;

        let mut session = session.lock().await;
        session.end_upload();
        let document = outcome?;
        session.add_document(document.clone());
        info!(
            "Accepted upload '{}' as document {}",
            document.file_name, document.id
        );
        Ok(document)
    }

    async fn extract_document(
        &self,
        file_name: &str,
        token: &CancellationToken,
    ) -> CoreResult<Document> {
        simulate_latency(self.latency.upload, token).await?;
        let content = run_cancellable(token, async {
            self.extractor
                .extract(file_name)
                .await
                .map_err(CoreError::from)
        })
        .await?;
        Ok(Document {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            content,
            uploaded_at: Utc::now(),
        })
    }

    /// Runs an analysis against the session's current document.
    pub async fn analyze_current(
        &self,
        session: &Mutex<Session>,
        request: AnalysisRequest,
        token: &CancellationToken,
    ) -> CoreResult<AnalysisResult> {
        let document_id = session
            .lock()
            .await
            .current_document()
            .map(|d| d.id)
            .ok_or(CoreError::NoCurrentDocument)?;
        self.analyze(session, document_id, request, token).await
    }

    /// Runs an analysis against a specific document and makes the result current.
    pub async fn analyze(
        &self,
        session: &Mutex<Session>,
        document_id: Uuid,
        request: AnalysisRequest,
        token: &CancellationToken,
    ) -> CoreResult<AnalysisResult> {
        if let AnalysisRequest::Custom { request } = &request {
            if request.trim().is_empty() {
                return Err(CoreError::EmptyInput("Custom request"));
            }
        }

        let document = {
            let mut session = session.lock().await;
            let document = session.document(document_id)?.clone();
            session.begin_analysis()?;
            document
        };

        let outcome = self.run_analysis(&document, &request, token).await;

        let mut session = session.lock().await;
        session.end_analysis();
        let result = outcome?;
        session.add_analysis(result.clone());
        info!(
            "Generated '{}' analysis {} for '{}'",
            result.output_kind, result.id, result.file_name
        );
        Ok(result)
    }

    async fn run_analysis(
        &self,
        document: &Document,
        request: &AnalysisRequest,
        token: &CancellationToken,
    ) -> CoreResult<AnalysisResult> {
        simulate_latency(self.latency.analysis, token).await?;
        let generated = run_cancellable(token, async {
            self.engine
                .analyze(&document.content, request)
                .await
                .map_err(CoreError::from)
        })
        .await?;

        Ok(AnalysisResult {
            id: Uuid::new_v4(),
            file_name: document.file_name.clone(),
            output_kind: request.output_kind(),
            content: generated.content,
            faq_examples: generated.faq_examples,
            created_at: Utc::now(),
            conversation: Vec::new(),
        })
    }

    /// Builds the speech-friendly script for a result and stores it on the session.
    pub async fn generate_audio_script(
        &self,
        session: &Mutex<Session>,
        analysis_id: Uuid,
        token: &CancellationToken,
    ) -> CoreResult<String> {
        let (content, kind) = {
            let mut session = session.lock().await;
            let result = session.analysis(analysis_id)?;
            let snapshot = (result.content.clone(), result.output_kind);
            session.begin_audio_script(analysis_id)?;
            snapshot
        };

        let outcome = simulate_latency(self.latency.audio_script, token).await;

        let mut session = session.lock().await;
        session.end_audio_script(analysis_id);
        outcome?;
        let script = audio::to_audio_text(&content, kind);
        session.set_audio_script(analysis_id, script.clone())?;
        info!("Generated audio script for analysis {}", analysis_id);
        Ok(script)
    }
}

/// A plain-text download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub body: String,
}

/// The result export: the audio script when one exists, else the result text.
pub fn export_analysis(session: &Session, analysis_id: Uuid) -> CoreResult<Export> {
    let result = session.analysis(analysis_id)?;
    let body = session
        .audio_script(analysis_id)
        .unwrap_or(&result.content)
        .to_string();
    Ok(Export {
        file_name: audio::export_file_name(&result.file_name, result.output_kind),
        body,
    })
}

pub fn export_audio_script(session: &Session, analysis_id: Uuid) -> CoreResult<Export> {
    let result = session.analysis(analysis_id)?;
    let body = session
        .audio_script(analysis_id)
        .ok_or(CoreError::NotFound("Audio script", analysis_id))?
        .to_string();
    Ok(Export {
        file_name: audio::audio_script_file_name(&result.file_name),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::TemplateAnalysisEngine;
    use crate::domain::{AnalysisKind, OutputKind};
    use crate::ports::{PortError, PortResult};
    use crate::templates::SAMPLE_PARAGRAPHS;
    use crate::upload::{FileDescriptor, SampleContentExtractor, MAX_UPLOAD_BYTES};
    use async_trait::async_trait;

    fn pipeline() -> DocumentPipeline {
        DocumentPipeline::new(
            Arc::new(SampleContentExtractor::new()),
            Arc::new(TemplateAnalysisEngine::new()),
            Latency::none(),
        )
    }

    fn notes() -> FileDescriptor {
        FileDescriptor::new("notes.txt", "text/plain", 500)
    }

    struct FixedExtractor(&'static str);

    #[async_trait]
    impl ContentExtractor for FixedExtractor {
        async fn extract(&self, _file_name: &str) -> PortResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenExtractor;

    #[async_trait]
    impl ContentExtractor for BrokenExtractor {
        async fn extract(&self, _file_name: &str) -> PortResult<String> {
            Err(PortError::Unexpected("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_end_to_end_upload_then_summary() {
        let pipeline = pipeline();
        let session = Mutex::new(Session::new());
        let token = CancellationToken::new();

        let document = pipeline.upload(&session, &notes(), &token).await.unwrap();
        assert_eq!(document.file_name, "notes.txt");
        assert!(SAMPLE_PARAGRAPHS.contains(&document.content.as_str()));

        let result = pipeline
            .analyze_current(&session, AnalysisRequest::Kind(AnalysisKind::Summary), &token)
            .await
            .unwrap();

        let session = session.lock().await;
        assert_eq!(session.analyses().len(), 1);
        let current = session.current_analysis().unwrap();
        assert_eq!(current, &result);
        assert_eq!(current.output_kind, OutputKind::Analysis(AnalysisKind::Summary));
        assert_eq!(current.faq_examples.len(), 2);
        assert_eq!(session.current_document().unwrap().id, document.id);
        assert!(!session.is_uploading());
        assert!(!session.is_analyzing());
    }

    #[tokio::test]
    async fn test_rejected_uploads_leave_no_state() {
        let pipeline = pipeline();
        let session = Mutex::new(Session::new());
        let token = CancellationToken::new();

        let png = FileDescriptor::new("photo.png", "image/png", 100);
        let huge = FileDescriptor::new("big.pdf", "application/pdf", MAX_UPLOAD_BYTES + 1);
        for file in [png, huge] {
            let err = pipeline.upload(&session, &file, &token).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }

        let session = session.lock().await;
        assert!(session.documents().is_empty());
        assert!(!session.is_uploading());
    }

    #[tokio::test]
    async fn test_upload_clears_current_analysis() {
        let pipeline = pipeline();
        let session = Mutex::new(Session::new());
        let token = CancellationToken::new();

        pipeline.upload(&session, &notes(), &token).await.unwrap();
        pipeline
            .analyze_current(&session, AnalysisRequest::Kind(AnalysisKind::Faqs), &token)
            .await
            .unwrap();
        let second = pipeline
            .upload(&session, &FileDescriptor::new("b.pdf", "application/pdf", 1), &token)
            .await
            .unwrap();

        let session = session.lock().await;
        assert_eq!(session.documents().len(), 2);
        assert_eq!(session.documents()[0].id, second.id);
        assert!(session.current_analysis().is_none());
    }

    #[tokio::test]
    async fn test_cancelled_upload_leaves_no_state() {
        let pipeline = DocumentPipeline::new(
            Arc::new(SampleContentExtractor::new()),
            Arc::new(TemplateAnalysisEngine::new()),
            Latency {
                upload: Duration::from_secs(3600),
                ..Latency::none()
            },
        );
        let session = Arc::new(Mutex::new(Session::new()));
        let token = CancellationToken::new();

        let task = {
            let pipeline = pipeline.clone();
            let session = session.clone();
            let token = token.clone();
            tokio::spawn(async move { pipeline.upload(&session, &notes(), &token).await })
        };
        tokio::task::yield_now().await;
        token.cancel();

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, Err(CoreError::Cancelled)));
        let session = session.lock().await;
        assert!(session.documents().is_empty());
        assert!(!session.is_uploading());
    }

    #[tokio::test]
    async fn test_extractor_failure_releases_flag() {
        let pipeline = DocumentPipeline::new(
            Arc::new(BrokenExtractor),
            Arc::new(TemplateAnalysisEngine::new()),
            Latency::none(),
        );
        let session = Mutex::new(Session::new());
        let err = pipeline
            .upload(&session, &notes(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Port(_)));
        assert!(!session.lock().await.is_uploading());
    }

    #[tokio::test]
    async fn test_analysis_requires_current_document() {
        let pipeline = pipeline();
        let session = Mutex::new(Session::new());
        let err = pipeline
            .analyze_current(
                &session,
                AnalysisRequest::Kind(AnalysisKind::Summary),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NoCurrentDocument));
    }

    #[tokio::test]
    async fn test_blank_custom_request_is_rejected() {
        let pipeline = pipeline();
        let session = Mutex::new(Session::new());
        let token = CancellationToken::new();
        pipeline.upload(&session, &notes(), &token).await.unwrap();

        let err = pipeline
            .analyze_current(
                &session,
                AnalysisRequest::Custom {
                    request: "   ".to_string(),
                },
                &token,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyInput(_)));
        assert!(session.lock().await.analyses().is_empty());
    }

    #[tokio::test]
    async fn test_custom_request_against_fixed_content() {
        let pipeline = DocumentPipeline::new(
            Arc::new(FixedExtractor("Short body.")),
            Arc::new(TemplateAnalysisEngine::new()),
            Latency::none(),
        );
        let session = Mutex::new(Session::new());
        let token = CancellationToken::new();
        pipeline.upload(&session, &notes(), &token).await.unwrap();

        let result = pipeline
            .analyze_current(
                &session,
                AnalysisRequest::Custom {
                    request: "Who benefits?".to_string(),
                },
                &token,
            )
            .await
            .unwrap();
        assert_eq!(result.output_kind, OutputKind::CustomRequest);
        assert!(result
            .content
            .starts_with("Based on your request: \"Who benefits?\"\n\nHere's the analysis: Short body.... "));
    }

    #[tokio::test]
    async fn test_audio_script_and_exports() {
        let pipeline = DocumentPipeline::new(
            Arc::new(FixedExtractor("Costs fell 40% over 3-5 years. Demand rose.")),
            Arc::new(TemplateAnalysisEngine::new()),
            Latency::none(),
        );
        let session = Mutex::new(Session::new());
        let token = CancellationToken::new();
        pipeline
            .upload(&session, &FileDescriptor::new("Report.pdf", "application/pdf", 10), &token)
            .await
            .unwrap();
        let result = pipeline
            .analyze_current(&session, AnalysisRequest::Kind(AnalysisKind::Summary), &token)
            .await
            .unwrap();

        let before = export_analysis(&*session.lock().await, result.id).unwrap();
        assert_eq!(before.file_name, "Report.pdf_summary.txt");
        assert_eq!(before.body, "Costs fell 40% over 3-5 years. Demand rose.");
        assert!(matches!(
            export_audio_script(&*session.lock().await, result.id),
            Err(CoreError::NotFound("Audio script", _))
        ));

        let script = pipeline
            .generate_audio_script(&session, result.id, &token)
            .await
            .unwrap();
        assert!(script.contains("Costs fell 40 percent over 3 to 5 years"));

        let session = session.lock().await;
        let after = export_analysis(&session, result.id).unwrap();
        assert_eq!(after.body, script);
        let audio = export_audio_script(&session, result.id).unwrap();
        assert_eq!(audio.file_name, "Report.pdf_audio_script.txt");
        assert!(!session.is_generating_audio(result.id));
    }
}
