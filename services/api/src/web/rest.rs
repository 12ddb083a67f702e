//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::config::Theme;
use crate::error::ApiError;
use crate::web::state::{AppState, SessionHandle};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use doc_analysis_core::{
    pipeline::{self, Export},
    task::CancellableTask,
    upload::{AcceptedFormat, FileSource, MAX_UPLOAD_BYTES},
    AnalysisKind, AnalysisRequest, AnalysisResult, ConversationEntry, Document, FaqExample,
    Session, SessionView,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        get_session_handler,
        close_session_handler,
        upload_document_handler,
        select_document_handler,
        analyze_handler,
        select_analysis_handler,
        ask_question_handler,
        audio_script_handler,
        export_analysis_handler,
        export_audio_script_handler,
    ),
    components(
        schemas(
            CreateSessionResponse,
            SessionViewResponse,
            ViewKind,
            ThemeResponse,
            AnalysisOptionResponse,
            DocumentResponse,
            AnalysisResponse,
            FaqExampleResponse,
            ConversationEntryResponse,
            AnalyzeRequest,
            QuestionRequest,
            AudioScriptResponse,
        )
    ),
    tags(
        (name = "Document Analysis API", description = "Upload documents, generate canned analyses, and prepare them for read-aloud playback.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ThemeResponse {
    name: String,
    accent: String,
    background: String,
}

impl From<Theme> for ThemeResponse {
    fn from(theme: Theme) -> Self {
        Self {
            name: theme.name().to_string(),
            accent: theme.accent().to_string(),
            background: theme.background().to_string(),
        }
    }
}

/// The response payload sent after successfully creating a session.
#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    theme: ThemeResponse,
}

/// Which panel the client should render.
#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Empty,
    Document,
    Analysis,
}

#[derive(Serialize, ToSchema)]
pub struct AnalysisOptionResponse {
    label: String,
    description: String,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    id: Uuid,
    file_name: String,
    content: String,
    uploaded_at: DateTime<Utc>,
}

impl From<&Document> for DocumentResponse {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            file_name: doc.file_name.clone(),
            content: doc.content.clone(),
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FaqExampleResponse {
    question: String,
    answer: String,
}

impl From<&FaqExample> for FaqExampleResponse {
    fn from(faq: &FaqExample) -> Self {
        Self {
            question: faq.question.clone(),
            answer: faq.answer.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ConversationEntryResponse {
    id: Uuid,
    question: String,
    answer: String,
    asked_at: DateTime<Utc>,
}

impl From<&ConversationEntry> for ConversationEntryResponse {
    fn from(entry: &ConversationEntry) -> Self {
        Self {
            id: entry.id,
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            asked_at: entry.asked_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AnalysisResponse {
    id: Uuid,
    file_name: String,
    output_type: String,
    content: String,
    faq_examples: Vec<FaqExampleResponse>,
    created_at: DateTime<Utc>,
    conversation: Vec<ConversationEntryResponse>,
    audio_script: Option<String>,
    is_answering: bool,
    is_generating_audio: bool,
}

impl AnalysisResponse {
    fn new(session: &Session, result: &AnalysisResult) -> Self {
        Self {
            id: result.id,
            file_name: result.file_name.clone(),
            output_type: result.output_kind.label().to_string(),
            content: result.content.clone(),
            faq_examples: result.faq_examples.iter().map(Into::into).collect(),
            created_at: result.created_at,
            conversation: result.conversation.iter().map(Into::into).collect(),
            audio_script: session.audio_script(result.id).map(str::to_string),
            is_answering: session.is_answering(result.id),
            is_generating_audio: session.is_generating_audio(result.id),
        }
    }
}

/// Everything a client needs to render one session.
#[derive(Serialize, ToSchema)]
pub struct SessionViewResponse {
    session_id: Uuid,
    view: ViewKind,
    current_document: Option<DocumentResponse>,
    current_analysis: Option<AnalysisResponse>,
    recent_documents: Vec<DocumentResponse>,
    recent_analyses: Vec<AnalysisResponse>,
    is_uploading: bool,
    is_analyzing: bool,
    analysis_options: Vec<AnalysisOptionResponse>,
    theme: ThemeResponse,
}

impl SessionViewResponse {
    fn new(session: &Session, theme: Theme) -> Self {
        let view = match session.view() {
            SessionView::Empty => ViewKind::Empty,
            SessionView::Document(_) => ViewKind::Document,
            SessionView::Analysis(_) => ViewKind::Analysis,
        };
        Self {
            session_id: session.id,
            view,
            current_document: session.current_document().map(Into::into),
            current_analysis: session
                .current_analysis()
                .map(|result| AnalysisResponse::new(session, result)),
            recent_documents: session.recent_documents().iter().map(Into::into).collect(),
            recent_analyses: session
                .recent_analyses()
                .iter()
                .map(|result| AnalysisResponse::new(session, result))
                .collect(),
            is_uploading: session.is_uploading(),
            is_analyzing: session.is_analyzing(),
            analysis_options: AnalysisKind::ALL
                .into_iter()
                .map(|kind| AnalysisOptionResponse {
                    label: kind.label().to_string(),
                    description: kind.description().to_string(),
                })
                .collect(),
            theme: theme.into(),
        }
    }
}

/// Either a fixed analysis label or a free-text request. A custom request
/// takes precedence when both are given.
#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    kind: Option<String>,
    custom_request: Option<String>,
}

impl AnalyzeRequest {
    fn into_request(self) -> Result<AnalysisRequest, ApiError> {
        match (self.custom_request, self.kind) {
            (Some(request), _) => Ok(AnalysisRequest::Custom { request }),
            (None, Some(label)) => label
                .parse::<AnalysisKind>()
                .map(AnalysisRequest::Kind)
                .map_err(|e| ApiError::BadRequest(e.to_string())),
            (None, None) => Err(ApiError::BadRequest(
                "Either `kind` or `custom_request` is required".to_string(),
            )),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct QuestionRequest {
    question: String,
}

#[derive(Serialize, ToSchema)]
pub struct AudioScriptResponse {
    analysis_id: Uuid,
    script: String,
    file_name: String,
}

/// A multipart file part, described by what the client declared.
struct UploadedFile {
    name: String,
    content_type: String,
    size: u64,
}

impl FileSource for UploadedFile {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn declared_type(&self) -> &str {
        &self.content_type
    }

    fn byte_size(&self) -> u64 {
        self.size
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

async fn session_handle(app_state: &AppState, session_id: Uuid) -> Result<SessionHandle, ApiError> {
    Ok(app_state.sessions.get(session_id).await?)
}

/// `attachment; filename="..."` with anything that would break the quoted
/// string, or is not printable ASCII, replaced by `_`.
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

fn text_download(export: Export) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                attachment_disposition(&export.file_name),
            ),
        ],
        export.body,
    )
}

/// Create a new, empty analysis session.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created successfully", body = CreateSessionResponse)
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let (session_id, handle) = app_state.sessions.create().await;
    let created_at = handle.state.lock().await.created_at;
    let response = CreateSessionResponse {
        session_id,
        created_at,
        theme: app_state.config.theme.into(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Render the current state of a session.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}",
    responses(
        (status = 200, description = "Current session view", body = SessionViewResponse),
        (status = 404, description = "Unknown session")
    ),
    params(("session_id" = Uuid, Path, description = "The analysis session."))
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;
    let session = handle.state.lock().await;
    Ok(Json(SessionViewResponse::new(&session, app_state.config.theme)))
}

/// Dismiss a session. Pending uploads and analyses are cancelled.
#[utoipa::path(
    delete,
    path = "/sessions/{session_id}",
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session")
    ),
    params(("session_id" = Uuid, Path, description = "The analysis session."))
)]
pub async fn close_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state.sessions.close(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a document into a session.
///
/// Accepts a multipart/form-data request with a single file part. The part's
/// declared content type must be PDF, DOCX or plain text, and it must not
/// exceed 10MB.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/documents",
    request_body(content_type = "multipart/form-data", description = "The document to upload."),
    responses(
        (status = 201, description = "Document accepted", body = DocumentResponse),
        (status = 400, description = "Bad request (e.g., missing file)"),
        (status = 409, description = "Another upload is in progress"),
        (status = 413, description = "File larger than 10MB"),
        (status = 415, description = "Unsupported file type")
    ),
    params(("session_id" = Uuid, Path, description = "The analysis session."))
)]
pub async fn upload_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;

    let mut field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
        .ok_or_else(|| ApiError::BadRequest("Multipart form must include a file".to_string()))?;
    let name = field.file_name().unwrap_or("untitled.txt").to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();

    // Only the byte count matters. Unsupported types are refused without
    // reading the body, and reading stops once the size ceiling is passed.
    let mut size = 0u64;
    if AcceptedFormat::from_mime_type(&content_type).is_some() {
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file bytes: {}", e)))?
        {
            size += chunk.len() as u64;
            if size > MAX_UPLOAD_BYTES {
                break;
            }
        }
    }
    let file = UploadedFile {
        name,
        content_type,
        size,
    };
    info!(
        "Upload of '{}' ({}, {} bytes) into session {}",
        file.name, file.content_type, file.size, session_id
    );

    let pipeline = app_state.pipeline.clone();
    let session = handle.state.clone();
    let document = CancellableTask::spawn(&handle.cancellation_token, |token| async move {
        pipeline.upload(&session, &file, &token).await
    })
    .join()
    .await?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(&document))))
}

/// Make a previously uploaded document current.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/documents/{document_id}/select",
    responses(
        (status = 200, description = "Document selected", body = DocumentResponse),
        (status = 404, description = "Unknown session or document")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The analysis session."),
        ("document_id" = Uuid, Path, description = "The document to select.")
    )
)]
pub async fn select_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;
    let mut session = handle.state.lock().await;
    let document = session.select_document(document_id)?;
    Ok(Json(DocumentResponse::from(document)))
}

/// Analyze the current document.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/analyses",
    request_body = AnalyzeRequest,
    responses(
        (status = 201, description = "Analysis generated", body = AnalysisResponse),
        (status = 400, description = "Unknown kind or empty custom request"),
        (status = 409, description = "No current document, or an analysis is already running")
    ),
    params(("session_id" = Uuid, Path, description = "The analysis session."))
)]
pub async fn analyze_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;
    let request = payload.into_request()?;

    let pipeline = app_state.pipeline.clone();
    let session = handle.state.clone();
    let result = CancellableTask::spawn(&handle.cancellation_token, |token| async move {
        pipeline.analyze_current(&session, request, &token).await
    })
    .join()
    .await?;

    let session = handle.state.lock().await;
    Ok((
        StatusCode::CREATED,
        Json(AnalysisResponse::new(&session, &result)),
    ))
}

/// Make a previous analysis result current.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/analyses/{analysis_id}/select",
    responses(
        (status = 200, description = "Analysis selected", body = AnalysisResponse),
        (status = 404, description = "Unknown session or analysis")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The analysis session."),
        ("analysis_id" = Uuid, Path, description = "The analysis result.")
    )
)]
pub async fn select_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, analysis_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;
    let mut session = handle.state.lock().await;
    session.select_analysis(analysis_id)?;
    let result = session.analysis(analysis_id)?;
    Ok(Json(AnalysisResponse::new(&session, result)))
}

/// Ask a follow-up question about an analysis result.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/analyses/{analysis_id}/questions",
    request_body = QuestionRequest,
    responses(
        (status = 201, description = "Question answered", body = ConversationEntryResponse),
        (status = 400, description = "Empty question"),
        (status = 409, description = "A question is already being answered")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The analysis session."),
        ("analysis_id" = Uuid, Path, description = "The analysis result.")
    )
)]
pub async fn ask_question_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, analysis_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;

    // The answer is not cancellable; running it on its own task guarantees the
    // processing lock is released even if the client goes away.
    let desk = app_state.follow_up.clone();
    let session = handle.state.clone();
    let entry = CancellableTask::spawn(&handle.cancellation_token, |_token| async move {
        desk.ask(&session, analysis_id, &payload.question).await
    })
    .join()
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationEntryResponse::from(&entry)),
    ))
}

/// Convert an analysis result into a speech-friendly script.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/analyses/{analysis_id}/audio-script",
    responses(
        (status = 200, description = "Audio script generated", body = AudioScriptResponse),
        (status = 404, description = "Unknown session or analysis"),
        (status = 409, description = "Already generating")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The analysis session."),
        ("analysis_id" = Uuid, Path, description = "The analysis result.")
    )
)]
pub async fn audio_script_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, analysis_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;

    let pipeline = app_state.pipeline.clone();
    let session = handle.state.clone();
    let script = CancellableTask::spawn(&handle.cancellation_token, |token| async move {
        pipeline
            .generate_audio_script(&session, analysis_id, &token)
            .await
    })
    .join()
    .await?;

    let session = handle.state.lock().await;
    let export = pipeline::export_audio_script(&session, analysis_id)?;
    Ok(Json(AudioScriptResponse {
        analysis_id,
        script,
        file_name: export.file_name,
    }))
}

/// Download an analysis result as plain text.
///
/// If an audio script has been generated for the result, the script is
/// downloaded instead of the raw analysis.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/analyses/{analysis_id}/export",
    responses(
        (status = 200, description = "Plain-text attachment", body = String, content_type = "text/plain"),
        (status = 404, description = "Unknown session or analysis")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The analysis session."),
        ("analysis_id" = Uuid, Path, description = "The analysis result.")
    )
)]
pub async fn export_analysis_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, analysis_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;
    let session = handle.state.lock().await;
    Ok(text_download(pipeline::export_analysis(&session, analysis_id)?))
}

/// Download the audio script of an analysis result.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/analyses/{analysis_id}/audio-script/export",
    responses(
        (status = 200, description = "Plain-text attachment", body = String, content_type = "text/plain"),
        (status = 404, description = "Unknown session or analysis, or no script yet")
    ),
    params(
        ("session_id" = Uuid, Path, description = "The analysis session."),
        ("analysis_id" = Uuid, Path, description = "The analysis result.")
    )
)]
pub async fn export_audio_script_handler(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, analysis_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = session_handle(&app_state, session_id).await?;
    let session = handle.state.lock().await;
    Ok(text_download(pipeline::export_audio_script(
        &session,
        analysis_id,
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_request_parsing() {
        let custom = AnalyzeRequest {
            kind: Some("Summary".to_string()),
            custom_request: Some("Who pays?".to_string()),
        };
        assert_eq!(
            custom.into_request().unwrap(),
            AnalysisRequest::Custom {
                request: "Who pays?".to_string()
            }
        );

        let kind = AnalyzeRequest {
            kind: Some("Bullet-Point Brief".to_string()),
            custom_request: None,
        };
        assert_eq!(
            kind.into_request().unwrap(),
            AnalysisRequest::Kind(AnalysisKind::BulletPointBrief)
        );

        let unknown = AnalyzeRequest {
            kind: Some("Poem".to_string()),
            custom_request: None,
        };
        assert!(matches!(unknown.into_request(), Err(ApiError::BadRequest(_))));

        let neither = AnalyzeRequest {
            kind: None,
            custom_request: None,
        };
        assert!(neither.into_request().is_err());
    }

    #[test]
    fn test_attachment_disposition_keeps_header_well_formed() {
        assert_eq!(
            attachment_disposition("Report.pdf_summary.txt"),
            "attachment; filename=\"Report.pdf_summary.txt\""
        );
        assert_eq!(
            attachment_disposition("a\"b\\c\r\nd.txt_summary.txt"),
            "attachment; filename=\"a_b_c__d.txt_summary.txt\""
        );
        assert_eq!(
            attachment_disposition("résumé.pdf_audio_script.txt"),
            "attachment; filename=\"r_sum_.pdf_audio_script.txt\""
        );
    }
}
