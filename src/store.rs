//! Store boundary: decoding loaded records and persist responses.
//!
//! The store itself lives outside this crate. These helpers turn what it
//! hands over (JSONL lines, JSON arrays, save responses) into typed values
//! without letting one bad record take the whole load down.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Document;

const REQUIRED_FIELDS: [&str; 3] = ["id", "text", "cues"];

/// Documents decoded from a load, plus what was dropped
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    /// 1-based line numbers (JSONL) or 0-based positions (arrays) that failed
    pub skipped: Vec<usize>,
    /// Loaded, but missing fields the store requires on save (same numbering)
    pub invalid: Vec<usize>,
}

impl LoadReport {
    fn push(&mut self, position: usize, value: Value) {
        let complete = validate_document(&value);
        match serde_json::from_value::<Document>(value) {
            Ok(doc) => {
                if !complete {
                    crate::console_warn!("[store] Record {} is missing required fields", position);
                    self.invalid.push(position);
                }
                self.documents.push(doc);
            }
            Err(e) => {
                crate::console_warn!("[store] Skipping record {}: {}", position, e);
                self.skipped.push(position);
            }
        }
    }
}

/// Record has the fields the store requires before it accepts a save
pub fn validate_document(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => REQUIRED_FIELDS.iter().all(|field| map.contains_key(*field)),
        None => false,
    }
}

/// One document per non-empty line
pub fn parse_jsonl(input: &str) -> LoadReport {
    let mut report = LoadReport::default();

    for (line_no, line) in input.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => report.push(line_no, value),
            Err(e) => {
                crate::console_warn!("[store] Skipping line {}: {}", line_no, e);
                report.skipped.push(line_no);
            }
        }
    }
    report
}

/// Decode an already-parsed array of records, skipping undecodable ones
pub fn documents_from_values(values: Vec<Value>) -> LoadReport {
    let mut report = LoadReport::default();

    for (i, value) in values.into_iter().enumerate() {
        report.push(i, value);
    }
    report
}

// =============================================================================
// Corpus statistics
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_documents: usize,
    pub total_cues: usize,
    pub total_scopes: usize,
    pub avg_cues_per_doc: f64,
    pub avg_scopes_per_doc: f64,
}

pub fn corpus_stats(documents: &[Document]) -> CorpusStats {
    let total_documents = documents.len();
    let total_cues: usize = documents.iter().map(|d| d.cues.len()).sum();
    let total_scopes: usize = documents.iter().map(|d| d.scopes.len()).sum();

    let avg = |total: usize| {
        if total_documents == 0 {
            0.0
        } else {
            total as f64 / total_documents as f64
        }
    };

    CorpusStats {
        total_documents,
        total_cues,
        total_scopes,
        avg_cues_per_doc: avg(total_cues),
        avg_scopes_per_doc: avg(total_scopes),
    }
}

// =============================================================================
// Save responses
// =============================================================================

const SUCCESS: &str = "success";

/// Response of the external persist call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub saved_count: usize,
    #[serde(default)]
    pub total_validated: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveOutcome {
    pub fn success(saved_count: usize, total_validated: usize) -> Self {
        Self {
            status: SUCCESS.to_string(),
            saved_count,
            total_validated,
            message: None,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    /// Decode whatever the persist call resolved with; a bare string is an
    /// error message
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(message) => Self::failure(&message),
            other => serde_json::from_value(other)
                .unwrap_or_else(|e| Self::failure(&format!("Unreadable save response: {}", e))),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS
    }

    pub fn failure_message(&self) -> String {
        self.message.clone().unwrap_or_else(|| "Save failed".to_string())
    }
}
