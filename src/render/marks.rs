//! Marks: one renderable unit per cue/scope segment.

use serde::{Deserialize, Serialize};

use crate::model::{Cue, Scope};
use crate::span::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Cue,
    Scope,
}

impl MarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Cue => "cue",
            MarkKind::Scope => "scope",
        }
    }
}

/// One segment of one cue or scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub kind: MarkKind,
    /// Index of the cue/scope in its list
    pub index: usize,
    /// Index of the segment within that cue/scope
    pub segment: usize,
    pub range: TextRange,
}

impl Mark {
    pub fn dom_id(&self) -> String {
        format!("{}-{}-{}", self.kind.as_str(), self.index, self.segment)
    }
}

/// Flattened, sorted marks plus what had to be left out
#[derive(Debug, Clone, Default)]
pub struct MarkSet {
    pub marks: Vec<Mark>,
    /// Segments that were malformed, empty or past the end of the text
    pub skipped: usize,
    /// Scopes with no renderable segment at all
    pub unresolved_scopes: Vec<usize>,
}

/// Flatten cues and scopes into marks sorted by start ascending, then end
/// descending, so that a longer mark opens before a shorter one starting at
/// the same offset and the shorter one nests inside it.
pub fn collect_marks(cues: &[Cue], scopes: &[Scope], text_len: usize) -> MarkSet {
    let mut set = MarkSet::default();

    for (index, cue) in cues.iter().enumerate() {
        for (segment, position) in cue.positions.iter().enumerate() {
            push_mark(&mut set, MarkKind::Cue, index, segment, position.range(), text_len);
        }
    }

    for (index, scope) in scopes.iter().enumerate() {
        match scope.positions.as_ref().filter(|p| !p.is_empty()) {
            Some(positions) => {
                let before = set.marks.len();
                for (segment, position) in positions.iter().enumerate() {
                    push_mark(&mut set, MarkKind::Scope, index, segment, position.range(), text_len);
                }
                if set.marks.len() == before {
                    set.unresolved_scopes.push(index);
                }
            }
            None => match (scope.start, scope.end) {
                (Some(start), Some(end)) if start <= end => {
                    let before = set.marks.len();
                    push_mark(&mut set, MarkKind::Scope, index, 0, Some(TextRange::new(start, end)), text_len);
                    if set.marks.len() == before {
                        set.unresolved_scopes.push(index);
                    }
                }
                _ => set.unresolved_scopes.push(index),
            },
        }
    }

    set.marks.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| b.range.end.cmp(&a.range.end))
    });
    set
}

fn push_mark(
    set: &mut MarkSet,
    kind: MarkKind,
    index: usize,
    segment: usize,
    range: Option<TextRange>,
    text_len: usize,
) {
    match range {
        Some(range) if range.fits(text_len) => set.marks.push(Mark { kind, index, segment, range }),
        _ => set.skipped += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Segment;
    use serde_json::json;

    #[test]
    fn test_sort_longer_first_on_same_start() {
        let cues = vec![Cue::new("c1", "ne", "NEG", &[TextRange::new(2, 4)])];
        let scopes = vec![Scope::direct(2, 10), Scope::direct(0, 1)];
        let set = collect_marks(&cues, &scopes, 10);

        let order: Vec<(MarkKind, usize)> = set.marks.iter().map(|m| (m.kind, m.index)).collect();
        assert_eq!(
            order,
            vec![(MarkKind::Scope, 1), (MarkKind::Scope, 0), (MarkKind::Cue, 0)]
        );
    }

    #[test]
    fn test_multi_segment_marks() {
        let cues = vec![Cue::new("c1", "ne...pas", "NEG", &[TextRange::new(3, 5), TextRange::new(12, 15)])];
        let set = collect_marks(&cues, &[], 20);
        assert_eq!(set.marks.len(), 2);
        assert_eq!(set.marks[1].segment, 1);
        assert_eq!(set.marks[1].dom_id(), "cue-0-1");
    }

    #[test]
    fn test_malformed_segments_skipped() {
        let mut cue = Cue::new("c1", "x", "NEG", &[]);
        cue.positions = vec![Segment(json!([1])), Segment(json!([0, 2])), Segment(json!([4, 40])), Segment(json!([3, 3]))];
        let set = collect_marks(&[cue], &[], 10);
        assert_eq!(set.marks.len(), 1);
        assert_eq!(set.skipped, 3);
        assert_eq!(set.marks[0].segment, 1);
    }

    #[test]
    fn test_unresolved_scopes_reported() {
        let mut bad_positions = Scope::described("y");
        bad_positions.positions = Some(vec![Segment(json!("oops"))]);
        let scopes = vec![Scope::described("x"), Scope::direct(1, 3), bad_positions];
        let set = collect_marks(&[], &scopes, 10);
        assert_eq!(set.unresolved_scopes, vec![0, 2]);
        assert_eq!(set.marks.len(), 1);
    }
}
