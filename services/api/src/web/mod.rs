pub mod playback;
pub mod protocol;
pub mod rest;
pub mod state;

use crate::web::{
    playback::playback_handler,
    rest::{
        analyze_handler, ask_question_handler, audio_script_handler, close_session_handler,
        create_session_handler, export_analysis_handler, export_audio_script_handler,
        get_session_handler, select_analysis_handler, select_document_handler,
        upload_document_handler, ApiDoc,
    },
    state::AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application: the REST API, the playback WebSocket, and
/// the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);
    match app_state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => warn!(
            "Ignoring invalid CORS origin '{}': {}",
            app_state.config.cors_origin, e
        ),
    }

    let api_router = Router::new()
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/{session_id}",
            get(get_session_handler).delete(close_session_handler),
        )
        // The upload handler enforces the size ceiling itself, so oversized
        // files get the validation error instead of a body-limit failure.
        .route(
            "/sessions/{session_id}/documents",
            post(upload_document_handler).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/sessions/{session_id}/documents/{document_id}/select",
            post(select_document_handler),
        )
        .route("/sessions/{session_id}/analyses", post(analyze_handler))
        .route(
            "/sessions/{session_id}/analyses/{analysis_id}/select",
            post(select_analysis_handler),
        )
        .route(
            "/sessions/{session_id}/analyses/{analysis_id}/questions",
            post(ask_question_handler),
        )
        .route(
            "/sessions/{session_id}/analyses/{analysis_id}/audio-script",
            post(audio_script_handler),
        )
        .route(
            "/sessions/{session_id}/analyses/{analysis_id}/export",
            get(export_analysis_handler),
        )
        .route(
            "/sessions/{session_id}/analyses/{analysis_id}/audio-script/export",
            get(export_audio_script_handler),
        )
        .route("/sessions/{session_id}/playback", get(playback_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
