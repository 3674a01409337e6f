//! Overlap and edit validation shared by the session and the renderer.

use crate::error::{AnnotationError, AnnotationKind, Result};
use crate::model::Scope;
use crate::span::TextRange;

/// Half-open overlap test between two ranges
pub fn scopes_overlap(a: &TextRange, b: &TextRange) -> bool {
    a.overlaps(b)
}

/// Two scopes overlap when any segment of one overlaps any segment of the other
pub fn scope_segments_overlap(a: &Scope, b: &Scope) -> bool {
    let b_segments = b.segments();
    a.segments()
        .iter()
        .any(|sa| b_segments.iter().any(|sb| scopes_overlap(sa, sb)))
}

/// Validate a hand-entered scope range against the text and existing scopes
pub fn validate_new_scope(start: i64, end: i64, text_len: usize, existing: &[Scope]) -> Result<TextRange> {
    let in_bounds = start >= 0 && end > start && usize::try_from(end).map_or(false, |e| e <= text_len);
    if !in_bounds {
        return Err(AnnotationError::InvalidBounds { start, end, len: text_len });
    }

    let candidate = TextRange::new(start as usize, end as usize);
    let proposed = Scope::direct(candidate.start, candidate.end);
    for (i, scope) in existing.iter().enumerate() {
        if scope_segments_overlap(&proposed, scope) {
            return Err(AnnotationError::Overlap {
                start: candidate.start,
                end: candidate.end,
                existing: i,
            });
        }
    }
    Ok(candidate)
}

pub fn check_index(kind: AnnotationKind, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(AnnotationError::IndexOutOfRange { kind, index, len })
    }
}
