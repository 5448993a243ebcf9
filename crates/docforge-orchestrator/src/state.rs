//! Workspace state and the intents that mutate it.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use docforge_core::{
    CompressionResult, DocumentAnalysis, DocumentId, DocumentTranslation, EnvironmentStatus,
    ProcessedDocument, SentimentLabel,
};

/// Append-only error log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Workspace-level aggregation over existing analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceInsights {
    pub document_count: usize,
    pub analyzed_count: usize,
    pub dominant_sentiment: Option<SentimentLabel>,
    pub top_topics: Vec<String>,
    pub average_readability: f64,
    pub generated_at: DateTime<Utc>,
}

/// Every mutation of [`WorkspaceState`] is one of these.
#[derive(Debug, Clone)]
pub enum StateIntent {
    AddDocument(ProcessedDocument),
    RemoveDocument(DocumentId),
    UpdateDocument(ProcessedDocument),
    Select(DocumentId),
    Deselect(DocumentId),
    ClearSelection,
    SetAnalysis(DocumentId, DocumentAnalysis),
    SetTranslation(DocumentId, DocumentTranslation),
    SetCompression(DocumentId, CompressionResult),
    AddMerged(ProcessedDocument),
    SetInsights(WorkspaceInsights),
    SetEnvironmentStatus(EnvironmentStatus),
    LogError(String),
    ClearErrors,
}

/// The whole document workspace. Documents keep insertion order; derived
/// artifacts are keyed by document id and replaced on re-run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceState {
    pub documents: Vec<ProcessedDocument>,
    pub selection: HashSet<DocumentId>,
    pub analyses: HashMap<DocumentId, DocumentAnalysis>,
    /// Per document, per target language; latest per target wins.
    pub translations: HashMap<DocumentId, HashMap<String, DocumentTranslation>>,
    pub compressions: HashMap<DocumentId, CompressionResult>,
    pub merged: Vec<ProcessedDocument>,
    pub error_log: Vec<ErrorEntry>,
    pub environment: EnvironmentStatus,
    pub processing: bool,
    pub insights: Option<WorkspaceInsights>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, id: DocumentId) -> Option<&ProcessedDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut ProcessedDocument> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.document(id).is_some()
    }

    /// Selected documents in insertion order.
    pub fn selected_documents(&self) -> Vec<&ProcessedDocument> {
        self.documents
            .iter()
            .filter(|d| self.selection.contains(&d.id))
            .collect()
    }

    pub fn apply(&mut self, intent: StateIntent) {
        match intent {
            StateIntent::AddDocument(doc) => {
                self.documents.push(doc);
            }
            StateIntent::RemoveDocument(id) => {
                self.documents.retain(|d| d.id != id);
                self.selection.remove(&id);
                self.analyses.remove(&id);
                self.translations.remove(&id);
                self.compressions.remove(&id);
            }
            StateIntent::UpdateDocument(doc) => match self.document_mut(doc.id) {
                Some(existing) => *existing = doc,
                None => warn!(id = %doc.id, "Update for unknown document ignored"),
            },
            StateIntent::Select(id) => {
                if self.contains(id) {
                    self.selection.insert(id);
                } else {
                    warn!(%id, "Select for unknown document ignored");
                }
            }
            StateIntent::Deselect(id) => {
                self.selection.remove(&id);
            }
            StateIntent::ClearSelection => {
                self.selection.clear();
            }
            StateIntent::SetAnalysis(id, analysis) => {
                self.analyses.insert(id, analysis);
            }
            StateIntent::SetTranslation(id, translation) => {
                self.translations
                    .entry(id)
                    .or_default()
                    .insert(translation.target_language.clone(), translation);
            }
            StateIntent::SetCompression(id, result) => {
                self.compressions.insert(id, result);
            }
            StateIntent::AddMerged(doc) => {
                self.merged.push(doc);
            }
            StateIntent::SetInsights(insights) => {
                self.insights = Some(insights);
            }
            StateIntent::SetEnvironmentStatus(status) => {
                self.environment = status;
            }
            StateIntent::LogError(message) => {
                self.error_log.push(ErrorEntry::new(message));
            }
            StateIntent::ClearErrors => {
                self.error_log.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, content: &str) -> ProcessedDocument {
        ProcessedDocument::new(name, "text/plain", content.len() as u64, content)
    }

    #[test]
    fn test_add_and_remove_document() {
        let mut state = WorkspaceState::new();
        let d = doc("a.txt", "hello");
        let id = d.id;

        state.apply(StateIntent::AddDocument(d));
        assert!(state.contains(id));

        state.apply(StateIntent::Select(id));
        state.apply(StateIntent::RemoveDocument(id));
        assert!(!state.contains(id));
        // Removal cascades to the selection.
        assert!(state.selection.is_empty());
    }

    #[test]
    fn test_update_document_replaces_in_place() {
        let mut state = WorkspaceState::new();
        let d = doc("a.txt", "body");
        let id = d.id;
        state.apply(StateIntent::AddDocument(d));

        let mut updated = state.document(id).unwrap().clone();
        updated.set_language("en");
        state.apply(StateIntent::UpdateDocument(updated));

        assert_eq!(state.documents.len(), 1);
        assert_eq!(
            state.document(id).unwrap().stats.language.as_deref(),
            Some("en")
        );
    }

    #[test]
    fn test_update_unknown_document_ignored() {
        let mut state = WorkspaceState::new();
        state.apply(StateIntent::UpdateDocument(doc("ghost.txt", "x")));
        assert!(state.documents.is_empty());
    }

    #[test]
    fn test_select_unknown_document_ignored() {
        let mut state = WorkspaceState::new();
        state.apply(StateIntent::Select(DocumentId::new()));
        assert!(state.selection.is_empty());
    }

    #[test]
    fn test_selected_documents_keep_insertion_order() {
        let mut state = WorkspaceState::new();
        let a = doc("a.txt", "1");
        let b = doc("b.txt", "2");
        let c = doc("c.txt", "3");
        let (ida, idc) = (a.id, c.id);

        state.apply(StateIntent::AddDocument(a));
        state.apply(StateIntent::AddDocument(b));
        state.apply(StateIntent::AddDocument(c));
        // Select in reverse order; iteration order must not change.
        state.apply(StateIntent::Select(idc));
        state.apply(StateIntent::Select(ida));

        let names: Vec<&str> = state
            .selected_documents()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
    }

    #[test]
    fn test_latest_translation_per_target_wins() {
        let mut state = WorkspaceState::new();
        let d = doc("a.txt", "hello");
        let id = d.id;
        state.apply(StateIntent::AddDocument(d));

        let mut first = DocumentTranslation {
            source_language: "en".to_string(),
            target_language: "es".to_string(),
            translated_text: "hola".to_string(),
            confidence: 0.9,
            truncated: false,
            created_at: Utc::now(),
        };
        state.apply(StateIntent::SetTranslation(id, first.clone()));

        first.translated_text = "hola de nuevo".to_string();
        state.apply(StateIntent::SetTranslation(id, first));

        let per_doc = &state.translations[&id];
        assert_eq!(per_doc.len(), 1);
        assert_eq!(per_doc["es"].translated_text, "hola de nuevo");
    }

    #[test]
    fn test_error_log_append_only_and_clearable() {
        let mut state = WorkspaceState::new();
        state.apply(StateIntent::LogError("compress: boom".to_string()));
        state.apply(StateIntent::LogError("analyze: bust".to_string()));
        assert_eq!(state.error_log.len(), 2);
        assert_eq!(state.error_log[0].message, "compress: boom");

        state.apply(StateIntent::ClearErrors);
        assert!(state.error_log.is_empty());
    }
}
