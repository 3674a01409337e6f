//! JS bindings
//!
//! # Usage (JavaScript)
//! ```javascript,ignore
//! import init, { AnnotationEditor } from 'annocore';
//!
//! await init();
//! const editor = new AnnotationEditor({ tie_break: 'leftmost' }, (msg, level) => toast(msg, level));
//! editor.load(await (await fetch('/api/annotations')).json());
//!
//! const view = editor.render();          // { html, marks, unresolved_scopes, stats }
//! textViewer.innerHTML = view.html;
//!
//! editor.addScope(5, 10);
//! await editor.saveAllEdited(docs =>
//!   fetch('/api/save', { method: 'POST', body: JSON.stringify(docs) }).then(r => r.json()));
//! ```

use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::config::EditorConfig;
use crate::error::AnnotationError;
use crate::model::{decode_records, Cue, Scope};
use crate::notify::{ConsoleNotifier, Feedback, FeedbackQueue, Notifier};
use crate::render::HighlightRenderer;
use crate::resolver::SpanResolver;
use crate::session::{EditSession, SaveBatch};
use crate::span::TextRange;
use crate::store::{documents_from_values, parse_jsonl, SaveOutcome};
use crate::validate::scopes_overlap;

// =============================================================================
// Conversions
// =============================================================================

/// Plain objects instead of JS `Map`s for flattened extra fields
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn err_to_js(e: AnnotationError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Decode an array element by element; elements that do not fit `T` stay
/// as empty records so indices match the caller's array
fn lenient_array<T: serde::de::DeserializeOwned + Default>(value: JsValue) -> Vec<T> {
    let values: Vec<Value> = serde_wasm_bindgen::from_value(value).unwrap_or_default();
    decode_records(values)
}

/// Whole non-negative number from JS, as the signed offset validation expects
fn js_offset(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

// =============================================================================
// Feedback delivery
// =============================================================================

/// Delivers queued session feedback to a JS callback `(message, level) => void`.
///
/// The session only queues; `flush` runs once the editor has released the
/// session, so the callback may call straight back into the editor.
#[derive(Clone)]
struct JsFeedback {
    queue: Rc<FeedbackQueue>,
    callback: Option<js_sys::Function>,
}

impl JsFeedback {
    fn flush(&self) {
        for (level, message) in self.queue.drain() {
            match &self.callback {
                Some(callback) => {
                    if let Err(e) = callback.call2(
                        &JsValue::NULL,
                        &JsValue::from_str(&message),
                        &JsValue::from_str(level.as_str()),
                    ) {
                        web_sys::console::error_2(&"[AnnotationEditor] Feedback callback threw".into(), &e);
                    }
                }
                None => ConsoleNotifier.notify(level, &message),
            }
        }
    }
}

type Session = EditSession<Rc<FeedbackQueue>>;

// =============================================================================
// AnnotationEditor
// =============================================================================

#[wasm_bindgen]
pub struct AnnotationEditor {
    session: Rc<RefCell<Session>>,
    feedback: JsFeedback,
}

#[wasm_bindgen]
impl AnnotationEditor {
    /// Create an editor
    ///
    /// # Arguments
    /// * `config` - Optional configuration object
    /// * `on_feedback` - Optional `(message, level) => void` callback
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, on_feedback: JsValue) -> Result<AnnotationEditor, JsValue> {
        let config: EditorConfig = if config.is_null() || config.is_undefined() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        let feedback = JsFeedback {
            queue: Rc::new(FeedbackQueue::new()),
            callback: on_feedback.dyn_into::<js_sys::Function>().ok(),
        };
        let session = EditSession::with_notifier(config, Rc::clone(&feedback.queue));

        Ok(Self {
            session: Rc::new(RefCell::new(session)),
            feedback,
        })
    }

    /// Load an array of document records; returns how many were kept
    #[wasm_bindgen]
    pub fn load(&self, documents: JsValue) -> Result<usize, JsValue> {
        let values: Vec<Value> = serde_wasm_bindgen::from_value(documents)
            .map_err(|e| JsValue::from_str(&format!("Invalid documents: {}", e)))?;
        let report = documents_from_values(values);
        Ok(self.update(|session| session.load_report(report)))
    }

    /// Load documents from JSONL text; returns how many were kept
    #[wasm_bindgen(js_name = loadJsonl)]
    pub fn load_jsonl(&self, input: &str) -> usize {
        let report = parse_jsonl(input);
        self.update(|session| session.load_report(report))
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.session.borrow().len()
    }

    #[wasm_bindgen(getter, js_name = currentIndex)]
    pub fn current_index(&self) -> usize {
        self.session.borrow().current_index()
    }

    #[wasm_bindgen(js_name = navigateTo)]
    pub fn navigate_to(&self, index: usize) -> bool {
        self.session.borrow_mut().navigate_to(index)
    }

    #[wasm_bindgen]
    pub fn next(&self) -> bool {
        self.session.borrow_mut().next()
    }

    #[wasm_bindgen]
    pub fn previous(&self) -> bool {
        self.session.borrow_mut().previous()
    }

    #[wasm_bindgen(js_name = canGoPrevious)]
    pub fn can_go_previous(&self) -> bool {
        self.session.borrow().can_go_previous()
    }

    #[wasm_bindgen(js_name = canGoNext)]
    pub fn can_go_next(&self) -> bool {
        self.session.borrow().can_go_next()
    }

    /// Current document (edited copy if any), or null
    #[wasm_bindgen]
    pub fn current(&self) -> Result<JsValue, JsValue> {
        match self.session.borrow().current() {
            Some(doc) => to_js(doc),
            None => Ok(JsValue::NULL),
        }
    }

    /// Render the current document: `{ html, marks, unresolved_scopes, stats }`
    #[wasm_bindgen]
    pub fn render(&self) -> Result<JsValue, JsValue> {
        let output = self.session.borrow().render_current().map_err(err_to_js)?;
        to_js(&output)
    }

    #[wasm_bindgen(js_name = cueList)]
    pub fn cue_list(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.borrow().cue_list())
    }

    #[wasm_bindgen(js_name = scopeList)]
    pub fn scope_list(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.borrow().scope_list())
    }

    #[wasm_bindgen]
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        match self.session.borrow().current_stats() {
            Some(stats) => to_js(&stats),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = corpusStats)]
    pub fn corpus_stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.borrow().corpus_stats())
    }

    /// Add a scope `[start, end)` to the current document
    #[wasm_bindgen(js_name = addScope)]
    pub fn add_scope(&self, start: f64, end: f64) -> Result<JsValue, JsValue> {
        let range = self.update(|session| match (js_offset(start), js_offset(end)) {
            (Some(start), Some(end)) => session.add_scope(start, end),
            _ => {
                let err = AnnotationError::MalformedInput("scope bounds must be integers".into());
                session.notifier().notify(Feedback::Error, &err.to_string());
                Err(err)
            }
        });
        to_js(&range.map_err(err_to_js)?)
    }

    #[wasm_bindgen(js_name = deleteScope)]
    pub fn delete_scope(&self, index: usize) -> Result<(), JsValue> {
        self.update(|session| session.delete_scope(index)).map(|_| ()).map_err(err_to_js)
    }

    #[wasm_bindgen(js_name = deleteCue)]
    pub fn delete_cue(&self, index: usize) -> Result<(), JsValue> {
        self.update(|session| session.delete_cue(index)).map(|_| ()).map_err(err_to_js)
    }

    #[wasm_bindgen(js_name = recalculateScope)]
    pub fn recalculate_scope(&self, index: usize) -> Result<(), JsValue> {
        self.update(|session| session.recalculate_scope(index)).map_err(err_to_js)
    }

    #[wasm_bindgen(js_name = resetCurrent)]
    pub fn reset_current(&self) -> Result<bool, JsValue> {
        self.update(|session| session.reset_current()).map_err(err_to_js)
    }

    #[wasm_bindgen(js_name = hasEdits)]
    pub fn has_edits(&self) -> bool {
        let session = self.session.borrow();
        session.has_edits(session.current_index())
    }

    #[wasm_bindgen(getter, js_name = editedCount)]
    pub fn edited_count(&self) -> usize {
        self.session.borrow().edited_count()
    }

    /// Persist the current document. `persist(docs)` may return a value or
    /// a Promise of `{ status, saved_count, total_validated, message? }`.
    #[wasm_bindgen(js_name = saveCurrent)]
    pub fn save_current(&self, persist: js_sys::Function) -> Result<js_sys::Promise, JsValue> {
        let batch = self.update(|session| session.pending_current()).map_err(err_to_js)?;
        Ok(self.persist_batch(batch, persist))
    }

    /// Persist every edited document
    #[wasm_bindgen(js_name = saveAllEdited)]
    pub fn save_all_edited(&self, persist: js_sys::Function) -> Result<js_sys::Promise, JsValue> {
        let batch = self.update(|session| session.pending_all()).map_err(err_to_js)?;
        Ok(self.persist_batch(batch, persist))
    }
}

impl AnnotationEditor {
    /// Run `f` on the session, then deliver its feedback with the session released
    fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let result = f(&mut self.session.borrow_mut());
        self.feedback.flush();
        result
    }

    fn persist_batch(&self, batch: SaveBatch, persist: js_sys::Function) -> js_sys::Promise {
        let session = Rc::clone(&self.session);
        let feedback = self.feedback.clone();

        wasm_bindgen_futures::future_to_promise(async move {
            let outcome = call_persist(&persist, &batch).await;
            let applied = session.borrow_mut().apply_save_outcome(&batch, &outcome);
            feedback.flush();
            let saved = applied.map_err(err_to_js)?;
            Ok(JsValue::from(saved as u32))
        })
    }
}

async fn call_persist(persist: &js_sys::Function, batch: &SaveBatch) -> SaveOutcome {
    let payload = match to_js(&batch.documents) {
        Ok(v) => v,
        Err(e) => return SaveOutcome::failure(&e.as_string().unwrap_or_default()),
    };

    let returned = match persist.call1(&JsValue::NULL, &payload) {
        Ok(v) => v,
        Err(e) => return SaveOutcome::failure(&js_error_message(&e)),
    };

    let resolved = if returned.is_instance_of::<js_sys::Promise>() {
        match JsFuture::from(js_sys::Promise::from(returned)).await {
            Ok(v) => v,
            Err(e) => return SaveOutcome::failure(&js_error_message(&e)),
        }
    } else {
        returned
    };

    match serde_wasm_bindgen::from_value::<Value>(resolved) {
        Ok(value) => SaveOutcome::from_value(value),
        Err(e) => SaveOutcome::failure(&format!("Unreadable save response: {}", e)),
    }
}

fn js_error_message(e: &JsValue) -> String {
    if let Some(s) = e.as_string() {
        return s;
    }
    e.dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .unwrap_or_else(|| "Save failed".to_string())
}

// =============================================================================
// Standalone functions
// =============================================================================

/// Resolve one scope against a text; unresolvable scopes come back unchanged
#[wasm_bindgen(js_name = resolveScopePositions)]
pub fn resolve_scope_positions(text: &str, scope: JsValue) -> Result<JsValue, JsValue> {
    let scope: Scope = serde_wasm_bindgen::from_value(scope)
        .map_err(|e| JsValue::from_str(&format!("Invalid scope: {}", e)))?;
    to_js(&SpanResolver::default().resolve_scope_positions(text, &scope))
}

/// Highlight markup for `text`. A non-string `text` yields an empty string;
/// non-array `cues`/`scopes` count as empty.
#[wasm_bindgen(js_name = renderHighlighted)]
pub fn render_highlighted(text: JsValue, cues: JsValue, scopes: JsValue) -> String {
    let text = match text.as_string() {
        Some(t) => t,
        None => return String::new(),
    };
    let cues: Vec<Cue> = lenient_array(cues);
    let scopes: Vec<Scope> = lenient_array(scopes);
    HighlightRenderer::default().render(&text, &cues, &scopes).html
}

/// Half-open overlap test between two `{ start, end }` objects
#[wasm_bindgen(js_name = scopesOverlap)]
pub fn js_scopes_overlap(a: JsValue, b: JsValue) -> Result<bool, JsValue> {
    let a: TextRange = serde_wasm_bindgen::from_value(a).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let b: TextRange = serde_wasm_bindgen::from_value(b).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(scopes_overlap(&a, &b))
}
