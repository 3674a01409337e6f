//! EditSession - single-editor annotation editing state
//!
//! Holds the loaded documents untouched and keeps a separate edit map from
//! document index to a modified copy. A document without an entry is
//! unedited. All mutation goes through `&mut self`, one document at a time,
//! addressed by `current_index`.
//!
//! Saving is split in two so hosts with async persistence can await in
//! between: `pending_current` / `pending_all` produce a `SaveBatch`, the host
//! persists it, then hands the response to `apply_save_outcome`. Edit entries
//! are only dropped after a successful save.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EditorConfig;
use crate::error::{AnnotationError, AnnotationKind, Result};
use crate::model::{Cue, Document, Scope};
use crate::notify::{Feedback, NoopNotifier, Notifier};
use crate::render::{cue_list, scope_list, CueListItem, HighlightRenderer, RenderOutput, ScopeListItem};
use crate::resolver::SpanResolver;
use crate::span::TextRange;
use crate::store::{corpus_stats, CorpusStats, LoadReport, SaveOutcome};
use crate::validate::{check_index, validate_new_scope};

/// Counters for the document being edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub cues_count: usize,
    pub scopes_count: usize,
    pub text_length: usize,
    pub has_edits: bool,
}

/// Documents handed to the persist layer, with the indices they came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveBatch {
    pub indices: Vec<usize>,
    pub documents: Vec<Document>,
}

pub struct EditSession<N: Notifier = NoopNotifier> {
    documents: Vec<Document>,
    current_index: usize,
    edits: HashMap<usize, Document>,
    resolver: SpanResolver,
    renderer: HighlightRenderer,
    config: EditorConfig,
    notifier: N,
}

impl Default for EditSession<NoopNotifier> {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditSession<NoopNotifier> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_notifier(config, NoopNotifier)
    }
}

impl<N: Notifier> EditSession<N> {
    pub fn with_notifier(config: EditorConfig, notifier: N) -> Self {
        Self {
            documents: Vec::new(),
            current_index: 0,
            edits: HashMap::new(),
            resolver: SpanResolver::new(&config),
            renderer: HighlightRenderer::new(&config),
            config,
            notifier,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    // =========================================================================
    // Loading & navigation
    // =========================================================================

    /// Replace the document list. Scopes given only as text are resolved
    /// once here; edits and position are reset.
    pub fn load(&mut self, documents: Vec<Document>) -> usize {
        self.documents = documents
            .into_iter()
            .map(|mut doc| {
                doc.scopes = self.resolver.resolve_all(&doc.text, &doc.scopes);
                doc
            })
            .collect();
        self.current_index = 0;
        self.edits.clear();

        let unresolved: usize = self
            .documents
            .iter()
            .map(|d| d.scopes.iter().filter(|s| !s.is_resolved()).count())
            .sum();
        if unresolved > 0 {
            crate::console_warn!("[EditSession] {} scope(s) left unresolved after load", unresolved);
        }

        if self.documents.is_empty() {
            self.notifier.notify(Feedback::Warning, "No annotations found");
        } else {
            self.notifier.notify(Feedback::Success, "Annotations loaded");
        }
        self.documents.len()
    }

    /// Load what the store decoded and report records it could not use
    pub fn load_report(&mut self, report: LoadReport) -> usize {
        let loaded = self.load(report.documents);
        if !report.skipped.is_empty() {
            self.notifier.notify(
                Feedback::Warning,
                &format!("{} record(s) could not be read and were skipped", report.skipped.len()),
            );
        }
        if !report.invalid.is_empty() {
            self.notifier.notify(
                Feedback::Warning,
                &format!("{} record(s) lack id, text or cues and will be rejected on save", report.invalid.len()),
            );
        }
        loaded
    }

    /// Loaded documents as they came from the store
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Current document: the edited copy when there is one, else the original
    pub fn current(&self) -> Option<&Document> {
        self.edits
            .get(&self.current_index)
            .or_else(|| self.documents.get(self.current_index))
    }

    pub fn navigate_to(&mut self, index: usize) -> bool {
        if index >= self.documents.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn next(&mut self) -> bool {
        self.navigate_to(self.current_index + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.navigate_to(index),
            None => false,
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.current_index + 1 < self.documents.len()
    }

    // =========================================================================
    // Edits
    // =========================================================================

    pub fn has_edits(&self, index: usize) -> bool {
        self.edits.contains_key(&index)
    }

    pub fn edited_count(&self) -> usize {
        self.edits.len()
    }

    /// Add a hand-entered scope `[start, end)` to the current document
    pub fn add_scope(&mut self, start: i64, end: i64) -> Result<TextRange> {
        let mut doc = self.working_copy()?;
        let range = match validate_new_scope(start, end, doc.char_len(), &doc.scopes) {
            Ok(range) => range,
            Err(e) => return Err(self.reject(e)),
        };

        doc.scopes.push(Scope::direct(range.start, range.end));
        doc.scopes.sort_by_key(|s| s.first_start().unwrap_or(usize::MAX));
        self.commit(doc);

        self.notifier.notify(Feedback::Success, "Scope added");
        Ok(range)
    }

    pub fn delete_scope(&mut self, index: usize) -> Result<Scope> {
        let mut doc = self.working_copy()?;
        if let Err(e) = check_index(AnnotationKind::Scope, index, doc.scopes.len()) {
            return Err(self.reject(e));
        }

        let removed = doc.scopes.remove(index);
        self.commit(doc);

        self.notifier.notify(Feedback::Success, "Scope deleted");
        Ok(removed)
    }

    pub fn delete_cue(&mut self, index: usize) -> Result<Cue> {
        let mut doc = self.working_copy()?;
        if let Err(e) = check_index(AnnotationKind::Cue, index, doc.cues.len()) {
            return Err(self.reject(e));
        }

        let removed = doc.cues.remove(index);
        self.commit(doc);

        self.notifier.notify(Feedback::Success, "Cue deleted");
        Ok(removed)
    }

    /// Re-run the resolver on a scope's text description
    pub fn recalculate_scope(&mut self, index: usize) -> Result<()> {
        let mut doc = self.working_copy()?;
        if let Err(e) = check_index(AnnotationKind::Scope, index, doc.scopes.len()) {
            return Err(self.reject(e));
        }

        let resolved = match self.resolver.recalculate(&doc.text, &doc.scopes[index], index) {
            Ok(scope) => scope,
            Err(e) => return Err(self.reject(e)),
        };
        doc.scopes[index] = resolved;
        self.commit(doc);

        self.notifier.notify(Feedback::Success, "Scope recalculated");
        Ok(())
    }

    /// Drop the current document's edits. Returns whether there were any.
    pub fn reset_current(&mut self) -> Result<bool> {
        if self.documents.is_empty() {
            return Err(self.reject(AnnotationError::NoDocument));
        }
        let had_edits = self.edits.remove(&self.current_index).is_some();
        self.notifier.notify(Feedback::Success, "Edits discarded");
        Ok(had_edits)
    }

    fn working_copy(&self) -> Result<Document> {
        match self.current() {
            Some(doc) => Ok(doc.clone()),
            None => Err(self.reject(AnnotationError::NoDocument)),
        }
    }

    fn commit(&mut self, doc: Document) {
        self.edits.insert(self.current_index, doc);
    }

    fn reject(&self, err: AnnotationError) -> AnnotationError {
        let level = if err.is_validation() { Feedback::Warning } else { Feedback::Error };
        self.notifier.notify(level, &err.to_string());
        err
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn render_current(&self) -> Result<RenderOutput> {
        let doc = self.current().ok_or(AnnotationError::NoDocument)?;
        Ok(self.renderer.render(&doc.text, &doc.cues, &doc.scopes))
    }

    pub fn cue_list(&self) -> Vec<CueListItem> {
        self.current().map(|doc| cue_list(&doc.cues)).unwrap_or_default()
    }

    pub fn scope_list(&self) -> Vec<ScopeListItem> {
        self.current()
            .map(|doc| scope_list(&doc.text, &doc.scopes, self.config.preview_chars))
            .unwrap_or_default()
    }

    pub fn current_stats(&self) -> Option<DocumentStats> {
        self.current().map(|doc| DocumentStats {
            cues_count: doc.cues.len(),
            scopes_count: doc.scopes.len(),
            text_length: doc.char_len(),
            has_edits: self.has_edits(self.current_index),
        })
    }

    pub fn corpus_stats(&self) -> CorpusStats {
        corpus_stats(&self.documents)
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// The current document (edited or not) as a one-element batch
    pub fn pending_current(&self) -> Result<SaveBatch> {
        let doc = self.working_copy()?;
        Ok(SaveBatch {
            indices: vec![self.current_index],
            documents: vec![doc],
        })
    }

    /// Every edited document, in index order
    pub fn pending_all(&self) -> Result<SaveBatch> {
        if self.edits.is_empty() {
            return Err(self.reject(AnnotationError::NothingToSave));
        }
        let mut indices: Vec<usize> = self.edits.keys().copied().collect();
        indices.sort_unstable();
        let documents = indices.iter().map(|i| self.edits[i].clone()).collect();
        Ok(SaveBatch { indices, documents })
    }

    /// Apply the persist layer's answer for `batch`.
    ///
    /// On success the batch's edit entries are dropped, unless the document
    /// was edited again since the batch was taken. On failure nothing changes.
    pub fn apply_save_outcome(&mut self, batch: &SaveBatch, outcome: &SaveOutcome) -> Result<usize> {
        if !outcome.is_success() {
            let message = outcome.failure_message();
            self.notifier.notify(Feedback::Error, &format!("Error: {}", message));
            return Err(AnnotationError::Transport(message));
        }

        for (index, saved) in batch.indices.iter().zip(&batch.documents) {
            if self.edits.get(index) == Some(saved) {
                self.edits.remove(index);
            }
        }

        self.notifier.notify(
            Feedback::Success,
            &format!(
                "{} annotation(s) saved. Total validated: {}",
                outcome.saved_count, outcome.total_validated
            ),
        );
        Ok(outcome.saved_count)
    }

    /// Save the current document through a synchronous persist function
    pub fn save_current_with<F>(&mut self, persist: F) -> Result<usize>
    where
        F: FnOnce(&[Document]) -> SaveOutcome,
    {
        let batch = self.pending_current()?;
        let outcome = persist(&batch.documents);
        self.apply_save_outcome(&batch, &outcome)
    }

    /// Save every edited document through a synchronous persist function
    pub fn save_all_with<F>(&mut self, persist: F) -> Result<usize>
    where
        F: FnOnce(&[Document]) -> SaveOutcome,
    {
        let batch = self.pending_all()?;
        let outcome = persist(&batch.documents);
        self.apply_save_outcome(&batch, &outcome)
    }
}
