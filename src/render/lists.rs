//! Side-panel list data for cues and scopes.
//!
//! Each item carries its list index so the display layer can bind a delete
//! control straight to `deleteCue(index)` / `deleteScope(index)`.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::model::{Cue, Scope};
use crate::span::{covered_len, TextIndex, TextRange};

const NO_POSITIONS: &str = "[?]";
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueListItem {
    pub index: usize,
    pub label: String,
    pub id: Option<String>,
    pub group: String,
    /// "3-5, 12-15" or "[?]"
    pub positions_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeListItem {
    pub index: usize,
    pub preview: String,
    pub positions_label: String,
    /// Characters covered, overlapping segments counted once
    pub char_count: usize,
    pub calculated: bool,
    pub resolved: bool,
}

fn positions_label(ranges: &[TextRange]) -> String {
    if ranges.is_empty() {
        return NO_POSITIONS.to_string();
    }
    ranges.iter().map(TextRange::label).collect::<Vec<_>>().join(", ")
}

/// Cut `text` to `max` graphemes, marking the cut with "..."
pub fn truncate_preview(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{}{}", head, ELLIPSIS)
    } else {
        head
    }
}

pub fn cue_list(cues: &[Cue]) -> Vec<CueListItem> {
    cues.iter()
        .enumerate()
        .map(|(index, cue)| CueListItem {
            index,
            label: cue.cue_label.clone(),
            id: cue.id.as_ref().map(ToString::to_string),
            group: cue.group.clone(),
            positions_label: positions_label(&cue.segments()),
        })
        .collect()
}

pub fn scope_list(text: &str, scopes: &[Scope], preview_chars: usize) -> Vec<ScopeListItem> {
    let index = TextIndex::new(text);
    let text_len = index.char_len();

    scopes
        .iter()
        .enumerate()
        .map(|(i, scope)| {
            let segments: Vec<TextRange> = scope
                .segments()
                .into_iter()
                .filter(|r| r.fits(text_len))
                .collect();

            let covered = if segments.is_empty() {
                scope.scope.clone().unwrap_or_default()
            } else {
                segments
                    .iter()
                    .filter_map(|r| index.slice(*r))
                    .collect::<Vec<_>>()
                    .join(" ... ")
            };

            ScopeListItem {
                index: i,
                preview: truncate_preview(&covered, preview_chars),
                positions_label: positions_label(&segments),
                char_count: covered_len(&segments),
                calculated: scope.is_calculated(),
                resolved: !segments.is_empty(),
            }
        })
        .collect()
}
