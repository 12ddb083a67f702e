//! crates/doc_analysis_core/src/session.rs
//!
//! The in-memory state of one analysis session: uploaded documents, analysis
//! results, which of each is current, and the in-flight flags.

use crate::domain::{AnalysisResult, ConversationEntry, Document};
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// How many documents the "recent documents" list shows.
pub const RECENT_DOCUMENTS: usize = 5;
/// How many results the "recent analysis" list shows.
pub const RECENT_ANALYSES: usize = 3;

/// What the main panel should show. An analysis takes priority over a
/// document, and a document over the empty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView<'a> {
    Empty,
    Document(&'a Document),
    Analysis(&'a AnalysisResult),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Newest first.
    documents: Vec<Document>,
    /// Newest first.
    analyses: Vec<AnalysisResult>,
    current_document: Option<Uuid>,
    current_analysis: Option<Uuid>,
    audio_scripts: HashMap<Uuid, String>,
    uploading: bool,
    analyzing: bool,
    generating_audio: HashSet<Uuid>,
    pending_questions: HashSet<Uuid>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            documents: Vec::new(),
            analyses: Vec::new(),
            current_document: None,
            current_analysis: None,
            audio_scripts: HashMap::new(),
            uploading: false,
            analyzing: false,
            generating_audio: HashSet::new(),
            pending_questions: HashSet::new(),
        }
    }

    // --- Documents ---

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn recent_documents(&self) -> &[Document] {
        &self.documents[..self.documents.len().min(RECENT_DOCUMENTS)]
    }

    pub fn document(&self, id: Uuid) -> CoreResult<&Document> {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .ok_or(CoreError::NotFound("Document", id))
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.current_document.and_then(|id| self.document(id).ok())
    }

    /// Publishes a freshly uploaded document as the newest and current one,
    /// and clears the current analysis.
    pub fn add_document(&mut self, document: Document) {
        self.current_document = Some(document.id);
        self.current_analysis = None;
        self.documents.insert(0, document);
    }

    /// Makes an existing document current. Like a fresh upload, this returns
    /// the main panel to the analysis options.
    pub fn select_document(&mut self, id: Uuid) -> CoreResult<&Document> {
        let index = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or(CoreError::NotFound("Document", id))?;
        self.current_document = Some(id);
        self.current_analysis = None;
        Ok(&self.documents[index])
    }

    // --- Analyses ---

    pub fn analyses(&self) -> &[AnalysisResult] {
        &self.analyses
    }

    pub fn recent_analyses(&self) -> &[AnalysisResult] {
        &self.analyses[..self.analyses.len().min(RECENT_ANALYSES)]
    }

    pub fn analysis(&self, id: Uuid) -> CoreResult<&AnalysisResult> {
        self.analyses
            .iter()
            .find(|a| a.id == id)
            .ok_or(CoreError::NotFound("Analysis", id))
    }

    pub fn current_analysis(&self) -> Option<&AnalysisResult> {
        self.current_analysis.and_then(|id| self.analysis(id).ok())
    }

    pub fn add_analysis(&mut self, result: AnalysisResult) {
        self.current_analysis = Some(result.id);
        self.analyses.insert(0, result);
    }

    /// Makes an existing result current. The current document is left alone.
    pub fn select_analysis(&mut self, id: Uuid) -> CoreResult<&AnalysisResult> {
        let index = self
            .analyses
            .iter()
            .position(|a| a.id == id)
            .ok_or(CoreError::NotFound("Analysis", id))?;
        self.current_analysis = Some(id);
        Ok(&self.analyses[index])
    }

    pub fn append_conversation(
        &mut self,
        analysis_id: Uuid,
        entry: ConversationEntry,
    ) -> CoreResult<()> {
        let result = self
            .analyses
            .iter_mut()
            .find(|a| a.id == analysis_id)
            .ok_or(CoreError::NotFound("Analysis", analysis_id))?;
        result.conversation.push(entry);
        Ok(())
    }

    pub fn view(&self) -> SessionView<'_> {
        if let Some(analysis) = self.current_analysis() {
            SessionView::Analysis(analysis)
        } else if let Some(document) = self.current_document() {
            SessionView::Document(document)
        } else {
            SessionView::Empty
        }
    }

    // --- Audio scripts ---

    pub fn audio_script(&self, analysis_id: Uuid) -> Option<&str> {
        self.audio_scripts.get(&analysis_id).map(String::as_str)
    }

    pub fn set_audio_script(&mut self, analysis_id: Uuid, script: String) -> CoreResult<()> {
        self.analysis(analysis_id)?;
        self.audio_scripts.insert(analysis_id, script);
        Ok(())
    }

    // --- In-flight flags ---

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn is_generating_audio(&self, analysis_id: Uuid) -> bool {
        self.generating_audio.contains(&analysis_id)
    }

    pub fn is_answering(&self, analysis_id: Uuid) -> bool {
        self.pending_questions.contains(&analysis_id)
    }

    pub(crate) fn begin_upload(&mut self) -> CoreResult<()> {
        if self.uploading {
            return Err(CoreError::Busy("Upload"));
        }
        self.uploading = true;
        Ok(())
    }

    pub(crate) fn end_upload(&mut self) {
        self.uploading = false;
    }

    pub(crate) fn begin_analysis(&mut self) -> CoreResult<()> {
        if self.analyzing {
            return Err(CoreError::Busy("Analysis"));
        }
        self.analyzing = true;
        Ok(())
    }

    pub(crate) fn end_analysis(&mut self) {
        self.analyzing = false;
    }

    pub(crate) fn begin_audio_script(&mut self, analysis_id: Uuid) -> CoreResult<()> {
        if !self.generating_audio.insert(analysis_id) {
            return Err(CoreError::Busy("Audio script generation"));
        }
        Ok(())
    }

    pub(crate) fn end_audio_script(&mut self, analysis_id: Uuid) {
        self.generating_audio.remove(&analysis_id);
    }

    pub(crate) fn begin_question(&mut self, analysis_id: Uuid) -> CoreResult<()> {
        if !self.pending_questions.insert(analysis_id) {
            return Err(CoreError::Busy("A follow-up question"));
        }
        Ok(())
    }

    pub(crate) fn end_question(&mut self, analysis_id: Uuid) {
        self.pending_questions.remove(&analysis_id);
    }
}
