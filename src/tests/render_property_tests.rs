//! Renderer invariants over generated texts and mark layouts.

use proptest::prelude::*;

use crate::config::EditorConfig;
use crate::model::{Cue, Scope};
use crate::render::{HighlightRenderer, RenderOutput};
use crate::span::TextRange;

/// Any ordered pair of offsets in `0..=len`, empty ranges included
fn range_in(len: usize) -> impl Strategy<Value = TextRange> {
    (0..=len, 0..=len).prop_map(|(a, b)| TextRange::new(a.min(b), a.max(b)))
}

/// Text with markup-sensitive and multibyte characters, plus cue and scope ranges inside it
fn layout() -> impl Strategy<Value = (String, Vec<Vec<TextRange>>, Vec<TextRange>)> {
    "[a-zéàç<>&'\" ,.]{0,40}".prop_flat_map(|text| {
        let len = text.chars().count();
        (
            Just(text),
            prop::collection::vec(prop::collection::vec(range_in(len), 1..3), 0..4),
            prop::collection::vec(range_in(len), 0..4),
        )
    })
}

fn build(cue_ranges: &[Vec<TextRange>], scope_ranges: &[TextRange]) -> (Vec<Cue>, Vec<Scope>) {
    let cues = cue_ranges
        .iter()
        .enumerate()
        .map(|(i, ranges)| Cue::new(format!("c{}", i).as_str(), "cue", "NEG", ranges))
        .collect();
    let scopes = scope_ranges.iter().map(|r| Scope::direct(r.start, r.end)).collect();
    (cues, scopes)
}

fn render(tooltips: bool, text: &str, cues: &[Cue], scopes: &[Scope]) -> RenderOutput {
    HighlightRenderer::new(&EditorConfig { tooltips, ..Default::default() }).render(text, cues, scopes)
}

/// Drop tags and tooltip captions, undo escaping
fn visible_text(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    let mut depth = 0usize;
    let mut rest = html;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with("<div") {
            depth += 1;
        } else if rest.starts_with("</div>") {
            depth -= 1;
        }
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag && depth == 0 => out.push(c),
            _ => {}
        }
        rest = &rest[c.len_utf8()..];
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

proptest! {
    #[test]
    fn proptest_text_is_never_dropped_or_duplicated(
        (text, cue_ranges, scope_ranges) in layout(),
        tooltips in any::<bool>(),
    ) {
        let (cues, scopes) = build(&cue_ranges, &scope_ranges);
        let out = render(tooltips, &text, &cues, &scopes);
        prop_assert_eq!(visible_text(&out.html), text);
    }

    #[test]
    fn proptest_tags_are_balanced((text, cue_ranges, scope_ranges) in layout()) {
        let (cues, scopes) = build(&cue_ranges, &scope_ranges);
        let out = render(true, &text, &cues, &scopes);

        let opens = out.html.matches("<span").count();
        prop_assert_eq!(opens, out.html.matches("</span>").count());
        prop_assert_eq!(opens, out.marks.len());
    }

    #[test]
    fn proptest_rendered_extent_stays_inside_mark((text, cue_ranges, scope_ranges) in layout()) {
        let (cues, scopes) = build(&cue_ranges, &scope_ranges);
        let out = render(true, &text, &cues, &scopes);

        for mark in &out.marks {
            prop_assert!(mark.start < mark.end);
            prop_assert!(mark.rendered_end > mark.start);
            prop_assert!(mark.rendered_end <= mark.end);
            prop_assert_eq!(mark.truncated, mark.rendered_end != mark.end);
        }
        prop_assert_eq!(out.stats.truncated_count, out.marks.iter().filter(|m| m.truncated).count());
    }

    #[test]
    fn proptest_every_nonempty_segment_is_drawn((text, cue_ranges, scope_ranges) in layout()) {
        let (cues, scopes) = build(&cue_ranges, &scope_ranges);
        let out = render(false, &text, &cues, &scopes);

        let drawable = cue_ranges
            .iter()
            .flatten()
            .chain(scope_ranges.iter())
            .filter(|r| !r.is_empty())
            .count();
        prop_assert_eq!(out.marks.len(), drawable);
    }
}
