//! HighlightRenderer - single-pass markup over cue and scope marks
//!
//! Walks the text one character at a time. At every offset it first closes
//! marks ending there (last opened, first closed), then opens marks starting
//! there in sorted order, then emits the escaped character.
//!
//! # Crossing marks
//! A linear tag stream cannot express two marks that overlap without one
//! containing the other. When an open mark reaches its end while marks opened
//! after it are still open, those inner marks are closed with it and are not
//! reopened. They are reported with `truncated = true` and their actual
//! `rendered_end`.

use serde::{Deserialize, Serialize};

use super::marks::{collect_marks, Mark, MarkKind};
use crate::config::EditorConfig;
use crate::model::{Cue, Scope};

// =============================================================================
// Output Types
// =============================================================================

/// Where a mark ended up in the markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMark {
    pub kind: MarkKind,
    pub index: usize,
    pub segment: usize,
    pub start: usize,
    pub end: usize,
    pub rendered_end: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderStats {
    pub total_us: u64,
    pub text_length: usize,
    pub mark_count: usize,
    pub skipped_segments: usize,
    pub truncated_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub html: String,
    /// Marks in opening order
    pub marks: Vec<RenderedMark>,
    /// Scopes with nothing to draw; shown as an error state by the display layer
    pub unresolved_scopes: Vec<usize>,
    pub stats: RenderStats,
}

// =============================================================================
// Renderer
// =============================================================================

#[derive(Debug, Clone)]
pub struct HighlightRenderer {
    tooltips: bool,
}

impl Default for HighlightRenderer {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl HighlightRenderer {
    pub fn new(config: &EditorConfig) -> Self {
        Self { tooltips: config.tooltips }
    }

    pub fn render(&self, text: &str, cues: &[Cue], scopes: &[Scope]) -> RenderOutput {
        let started = instant::Instant::now();

        let chars: Vec<char> = text.chars().collect();
        let text_len = chars.len();
        let set = collect_marks(cues, scopes, text_len);

        let mut html = String::with_capacity(text.len() + set.marks.len() * 160);
        let mut rendered: Vec<RenderedMark> = Vec::with_capacity(set.marks.len());
        // Indices into `rendered` (== indices into `set.marks`)
        let mut open: Vec<usize> = Vec::new();
        let mut next = 0;

        for i in 0..=text_len {
            if let Some(depth) = open.iter().position(|&m| set.marks[m].range.end == i) {
                while open.len() > depth {
                    if let Some(m) = open.pop() {
                        html.push_str("</span>");
                        let entry = &mut rendered[m];
                        entry.rendered_end = i;
                        entry.truncated = entry.end != i;
                    }
                }
            }

            while next < set.marks.len() && set.marks[next].range.start == i {
                let mark = &set.marks[next];
                self.open_mark(&mut html, mark, cues);
                rendered.push(RenderedMark {
                    kind: mark.kind,
                    index: mark.index,
                    segment: mark.segment,
                    start: mark.range.start,
                    end: mark.range.end,
                    rendered_end: mark.range.end,
                    truncated: false,
                });
                open.push(next);
                next += 1;
            }

            if i < text_len {
                push_escaped_char(&mut html, chars[i]);
            }
        }

        // Marks are bounded by the text, nothing should be left open here
        while let Some(m) = open.pop() {
            html.push_str("</span>");
            let entry = &mut rendered[m];
            entry.rendered_end = text_len;
            entry.truncated = entry.end != text_len;
        }

        let truncated_count = rendered.iter().filter(|m| m.truncated).count();
        if truncated_count > 0 {
            crate::console_log!("[HighlightRenderer] {} crossing mark(s) truncated", truncated_count);
        }

        RenderOutput {
            html,
            stats: RenderStats {
                total_us: started.elapsed().as_micros() as u64,
                text_length: text_len,
                mark_count: rendered.len(),
                skipped_segments: set.skipped,
                truncated_count,
            },
            marks: rendered,
            unresolved_scopes: set.unresolved_scopes,
        }
    }

    fn open_mark(&self, html: &mut String, mark: &Mark, cues: &[Cue]) {
        let kind = mark.kind.as_str();
        html.push_str(&format!(
            "<span class=\"{} marker-appear\" data-start=\"{}\" data-end=\"{}\" data-index=\"{}\" data-segment=\"{}\" data-id=\"{}\">",
            kind,
            mark.range.start,
            mark.range.end,
            mark.index,
            mark.segment,
            mark.dom_id(),
        ));

        if !self.tooltips {
            return;
        }

        let range = format!("[{}-{}]", mark.range.start, mark.range.end);
        match mark.kind {
            MarkKind::Cue => {
                let cue = &cues[mark.index];
                let title = match &cue.id {
                    Some(id) => id.to_string(),
                    None => cue.cue_label.clone(),
                };
                html.push_str(&format!(
                    "<div class=\"marker-tooltip\"><div>{}</div><div>{} {}</div></div>",
                    escape_html(&title),
                    range,
                    escape_html(&cue.group),
                ));
            }
            MarkKind::Scope => {
                html.push_str(&format!(
                    "<div class=\"marker-tooltip\"><div>Scope</div><div>{}</div></div>",
                    range
                ));
            }
        }
    }
}

/// Render with default settings, markup only
pub fn render_highlighted(text: &str, cues: &[Cue], scopes: &[Scope]) -> String {
    HighlightRenderer::default().render(text, cues, scopes).html
}

// =============================================================================
// Escaping
// =============================================================================

fn push_escaped_char(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped_char(&mut out, c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::TextRange;
    use pretty_assertions::assert_eq;

    fn plain() -> HighlightRenderer {
        HighlightRenderer::new(&EditorConfig { tooltips: false, ..Default::default() })
    }

    /// Drop tags, undo escaping: what a reader of the page would see
    fn visible_text(html: &str) -> String {
        let mut out = String::new();
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    /// Sequence of opens ("+cue-0-0") and closes ("-") in the markup
    fn tag_events(html: &str) -> Vec<String> {
        let mut events = Vec::new();
        let mut rest = html;
        while let Some(pos) = rest.find('<') {
            rest = &rest[pos..];
            if rest.starts_with("</span>") {
                events.push("-".to_string());
            } else if rest.starts_with("<span") {
                let id_start = rest.find("data-id=\"").map(|p| p + 9).unwrap_or(0);
                let id_end = rest[id_start..].find('"').map(|p| p + id_start).unwrap_or(id_start);
                events.push(format!("+{}", &rest[id_start..id_end]));
            }
            rest = &rest[1..];
        }
        events
    }

    #[test]
    fn test_no_marks_is_escaped_text() {
        assert_eq!(plain().render("a<b & 'c'", &[], &[]).html, "a&lt;b &amp; &#39;c&#39;");
    }

    #[test]
    fn test_single_scope() {
        let out = plain().render("il ne vient pas", &[], &[Scope::direct(3, 5)]);
        assert_eq!(
            out.html,
            "il <span class=\"scope marker-appear\" data-start=\"3\" data-end=\"5\" data-index=\"0\" data-segment=\"0\" data-id=\"scope-0-0\">ne</span> vient pas"
        );
    }

    #[test]
    fn test_nested_marks() {
        let text = "il ne vient pas";
        let cues = vec![Cue::new("c1", "ne", "NEG", &[TextRange::new(3, 5)])];
        let scopes = vec![Scope::direct(3, 15)];
        let out = plain().render(text, &cues, &scopes);

        assert_eq!(tag_events(&out.html), vec!["+scope-0-0", "+cue-0-0", "-", "-"]);
        assert_eq!(visible_text(&out.html), text);
        assert!(out.marks.iter().all(|m| !m.truncated));
    }

    #[test]
    fn test_shared_boundary_closes_before_open() {
        let scopes = vec![Scope::direct(0, 2), Scope::direct(2, 4)];
        let out = plain().render("abcd", &[], &scopes);
        assert_eq!(tag_events(&out.html), vec!["+scope-0-0", "-", "+scope-1-0", "-"]);
    }

    #[test]
    fn test_crossing_marks_truncate_inner() {
        let cues = vec![Cue::new("c1", "x", "NEG", &[TextRange::new(0, 5)])];
        let scopes = vec![Scope::direct(3, 8)];
        let out = plain().render("0123456789", &cues, &scopes);

        assert_eq!(tag_events(&out.html), vec!["+cue-0-0", "+scope-0-0", "-", "-"]);
        assert_eq!(visible_text(&out.html), "0123456789");

        let scope = out.marks.iter().find(|m| m.kind == MarkKind::Scope).unwrap();
        assert_eq!((scope.rendered_end, scope.truncated), (5, true));
        assert_eq!(out.stats.truncated_count, 1);
    }

    #[test]
    fn test_multi_segment_scope() {
        let mut scope = Scope::described("ne, pas");
        scope.positions = Some(vec![TextRange::new(3, 5).into(), TextRange::new(12, 15).into()]);
        let out = plain().render("il ne vient pas", &[], &[scope]);
        assert_eq!(tag_events(&out.html), vec!["+scope-0-0", "-", "+scope-0-1", "-"]);
    }

    #[test]
    fn test_unreadable_cues_keep_later_indices() {
        let cues: Vec<Cue> = crate::model::decode_records(vec![
            serde_json::json!({"id": "c1", "positions": "bad"}),
            serde_json::json!(42),
            serde_json::json!({"id": "c3", "group": null, "positions": [[3, 5]]}),
        ]);
        let out = plain().render("il ne vient pas", &cues, &[]);

        assert_eq!(out.marks.len(), 1);
        assert_eq!(out.marks[0].index, 2);
        assert!(out.html.contains("data-index=\"2\""));
    }

    #[test]
    fn test_tooltip_escapes_metadata() {
        let cues = vec![Cue::new("<c1>", "ne", "A&B", &[TextRange::new(0, 2)])];
        let html = render_highlighted("ne pas", &cues, &[]);
        assert!(html.contains("<div>&lt;c1&gt;</div><div>[0-2] A&amp;B</div>"));
    }

    #[test]
    fn test_multibyte_text() {
        let scopes = vec![Scope::direct(4, 7)];
        let out = plain().render("pas été là", &[], &scopes);
        assert!(out.html.contains("data-id=\"scope-0-0\">été</span>"));
        assert_eq!(visible_text(&out.html), "pas été là");
    }

    #[test]
    fn test_mark_reaching_end_of_text() {
        let out = plain().render("abc", &[], &[Scope::direct(1, 3)]);
        assert!(out.html.ends_with("bc</span>"));
        assert_eq!(out.marks[0].rendered_end, 3);
    }

    #[test]
    fn test_every_open_closed_once() {
        let text = "Elle ne mange jamais de viande, ni de poisson.";
        let cues = vec![
            Cue::new("c1", "ne...jamais", "NEG", &[TextRange::new(5, 7), TextRange::new(14, 20)]),
            Cue::new("c2", "ni", "NEG", &[TextRange::new(32, 34)]),
        ];
        let scopes = vec![Scope::direct(5, 30), Scope::direct(32, 45)];
        let out = plain().render(text, &cues, &scopes);

        let events = tag_events(&out.html);
        let mut depth: i32 = 0;
        for e in &events {
            depth += if e == "-" { -1 } else { 1 };
            assert!(depth >= 0);
        }
        assert_eq!(depth, 0);
        assert_eq!(events.iter().filter(|e| *e == "-").count(), 5);
        assert_eq!(visible_text(&out.html), text);
        assert!(out.marks.iter().all(|m| !m.truncated));
    }

    #[test]
    fn test_unresolved_scope_listed() {
        let out = plain().render("abc", &[], &[Scope::described("zzz")]);
        assert_eq!(out.unresolved_scopes, vec![0]);
        assert_eq!(out.html, "abc");
    }
}
