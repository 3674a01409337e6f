//! SpanResolver: scope text descriptions → character ranges
//!
//! A scope may arrive with only a free-text description ("ne ... pas du
//! tout, jamais"). Each comma-separated part is located in the document:
//!
//! 1. All exact occurrences (overlapping allowed), pick one by tie-break.
//! 2. No exact match: strip punctuation, try the words longest-first
//!    (minimum 3 characters), first word with a match wins.
//! 3. Nothing matched: the part contributes no range.
//!
//! Resolution is pure: the input scope is never mutated, and scopes whose
//! `positions` are already well-formed come back unchanged.

use regex::Regex;

use crate::config::{EditorConfig, TieBreak};
use crate::error::{AnnotationError, Result};
use crate::model::{Scope, Segment};
use crate::span::{TextIndex, TextRange};

const LENGTH_WEIGHT: f64 = 0.7;
const POSITION_WEIGHT: f64 = 0.3;

pub struct SpanResolver {
    punctuation_re: Regex,
    tie_break: TieBreak,
    min_keyword_len: usize,
    part_separator: char,
}

impl Default for SpanResolver {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl SpanResolver {
    pub fn new(config: &EditorConfig) -> Self {
        // Anything that is neither a word character nor whitespace
        let punctuation_re = Regex::new(r"[^\w\s]").unwrap();

        Self {
            punctuation_re,
            tie_break: config.tie_break,
            min_keyword_len: config.min_keyword_len,
            part_separator: config.part_separator,
        }
    }

    /// Resolve one scope against `text`.
    ///
    /// Returns a new scope with `positions` (one range per resolved part) and
    /// `calculated = true`, or an unchanged copy when nothing could be located.
    pub fn resolve_scope_positions(&self, text: &str, scope: &Scope) -> Scope {
        if scope.has_valid_positions() {
            return scope.clone();
        }

        let description = match scope.scope.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d,
            _ => return scope.clone(),
        };

        let index = TextIndex::new(text);
        let ranges: Vec<TextRange> = description
            .split(self.part_separator)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| self.resolve_part(&index, part))
            .collect();

        if ranges.is_empty() {
            crate::console_warn!("[SpanResolver] Could not resolve scope: {:?}", description);
            return scope.clone();
        }

        Scope {
            positions: Some(ranges.into_iter().map(Segment::from).collect()),
            calculated: Some(true),
            ..scope.clone()
        }
    }

    /// Resolve every scope of a document, in order
    pub fn resolve_all(&self, text: &str, scopes: &[Scope]) -> Vec<Scope> {
        scopes
            .iter()
            .map(|scope| self.resolve_scope_positions(text, scope))
            .collect()
    }

    /// Throw away existing positions and resolve the description again.
    ///
    /// `index` only labels the error for scopes without a description.
    pub fn recalculate(&self, text: &str, scope: &Scope, index: usize) -> Result<Scope> {
        let description = match scope.scope.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => return Err(AnnotationError::MissingScopeText(index)),
        };

        let cleared = Scope {
            positions: None,
            calculated: None,
            ..scope.clone()
        };
        let resolved = self.resolve_scope_positions(text, &cleared);
        if resolved.positions.is_none() {
            return Err(AnnotationError::Unresolved(description));
        }
        Ok(resolved)
    }

    fn resolve_part(&self, index: &TextIndex, part: &str) -> Option<TextRange> {
        let part_len = part.chars().count();
        let text_len = index.char_len();

        let exact = index.find_all(part);
        if !exact.is_empty() {
            return self.select(&exact, part_len, text_len);
        }

        self.extract_keywords(part)
            .iter()
            .filter(|keyword| keyword.chars().count() >= self.min_keyword_len)
            .map(|keyword| index.find_all(keyword))
            .find(|hits| !hits.is_empty())
            .and_then(|hits| self.select(&hits, part_len, text_len))
    }

    /// Words of `part` with punctuation removed, longest first.
    /// Words of equal length keep their original order.
    pub fn extract_keywords(&self, part: &str) -> Vec<String> {
        let stripped = self.punctuation_re.replace_all(part, " ");
        let mut words: Vec<String> = stripped.split_whitespace().map(str::to_string).collect();
        words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        words
    }

    fn select(&self, candidates: &[TextRange], part_len: usize, text_len: usize) -> Option<TextRange> {
        match self.tie_break {
            TieBreak::Leftmost => candidates.first().copied(),
            TieBreak::Scored => {
                let mut best: Option<(TextRange, f64)> = None;
                for &candidate in candidates {
                    let score = score_candidate(candidate, part_len, text_len);
                    match best {
                        Some((_, best_score)) if score <= best_score => {}
                        _ => best = Some((candidate, score)),
                    }
                }
                best.map(|(range, _)| range)
            }
        }
    }
}

/// Quality of a candidate range for a scope part of `part_len` characters
pub fn score_candidate(range: TextRange, part_len: usize, text_len: usize) -> f64 {
    if part_len == 0 || text_len == 0 {
        return 0.0;
    }
    let length_score = range.len() as f64 / part_len as f64;
    let position_score = 1.0 - (range.start as f64 / text_len as f64);
    length_score * LENGTH_WEIGHT + position_score * POSITION_WEIGHT
}

/// Resolve with default settings
pub fn resolve_scope_positions(text: &str, scope: &Scope) -> Scope {
    SpanResolver::default().resolve_scope_positions(text, scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn positions(scope: &Scope) -> Vec<TextRange> {
        scope
            .positions
            .as_ref()
            .map(|p| p.iter().filter_map(Segment::range).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_leftmost_tie_break() {
        let resolved = resolve_scope_positions("aXbXc", &Scope::described("X"));
        assert_eq!(positions(&resolved), vec![TextRange::new(1, 2)]);
        assert_eq!(resolved.calculated, Some(true));
    }

    #[test]
    fn test_multi_part_description() {
        let text = "The cat sat. The dog ran.";
        let resolved = resolve_scope_positions(text, &Scope::described("cat, dog"));
        assert_eq!(positions(&resolved), vec![TextRange::new(4, 7), TextRange::new(17, 20)]);
    }

    #[test]
    fn test_keyword_fallback() {
        let resolved = resolve_scope_positions("quick brown fox", &Scope::described("slow brown fox"));
        assert_eq!(positions(&resolved), vec![TextRange::new(6, 11)]);
        assert_eq!(resolved.calculated, Some(true));
    }

    #[test]
    fn test_keyword_fallback_ignores_short_words() {
        // the only keyword is shorter than three characters
        let resolved = resolve_scope_positions("an ox", &Scope::described("ox!"));
        assert!(resolved.positions.is_none());
    }

    #[test]
    fn test_unresolved_scope_unchanged() {
        let scope = Scope::described("nowhere to be found");
        let resolved = resolve_scope_positions("quick brown fox", &scope);
        assert_eq!(resolved, scope);
        assert!(resolved.calculated.is_none());
    }

    #[test]
    fn test_partially_resolved_parts() {
        let resolved = resolve_scope_positions("il ne mange pas", &Scope::described("zzz, mange"));
        assert_eq!(positions(&resolved), vec![TextRange::new(6, 11)]);
    }

    #[test]
    fn test_idempotent() {
        let text = "The cat sat. The dog ran.";
        let once = resolve_scope_positions(text, &Scope::described("cat, dog"));
        let twice = resolve_scope_positions(text, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_positions_kept() {
        let mut scope = Scope::described("cat");
        scope.positions = Some(vec![Segment(json!([13, 16]))]);
        let resolved = resolve_scope_positions("The cat sat. The dog ran.", &scope);
        assert_eq!(resolved, scope);
    }

    #[test]
    fn test_malformed_positions_recomputed() {
        let mut scope = Scope::described("dog");
        scope.positions = Some(vec![Segment(json!([13]))]);
        let resolved = resolve_scope_positions("The cat sat. The dog ran.", &scope);
        assert_eq!(positions(&resolved), vec![TextRange::new(17, 20)]);
    }

    #[test]
    fn test_numeric_positions_pass_through_even_if_undrawable() {
        let mut scope = Scope::described("dog");
        scope.positions = Some(vec![Segment(json!([20, 17]))]);
        let resolved = resolve_scope_positions("The cat sat. The dog ran.", &scope);
        assert_eq!(resolved, scope);
    }

    #[test]
    fn test_input_not_mutated() {
        let scope = Scope::described("cat");
        let _ = resolve_scope_positions("cat", &scope);
        assert!(scope.positions.is_none());
    }

    #[test]
    fn test_extract_keywords_order() {
        let resolver = SpanResolver::default();
        assert_eq!(
            resolver.extract_keywords("n'a, jamais vu-ça"),
            vec!["jamais", "vu", "ça", "n", "a"]
        );
        assert_eq!(resolver.extract_keywords("slow brown fox"), vec!["brown", "slow", "fox"]);
    }

    #[test]
    fn test_recalculate() {
        let resolver = SpanResolver::default();
        let text = "The cat sat. The dog ran.";
        let mut scope = Scope::described("dog");
        scope.positions = Some(vec![TextRange::new(0, 3).into()]);

        let redone = resolver.recalculate(text, &scope, 0).unwrap();
        assert_eq!(positions(&redone), vec![TextRange::new(17, 20)]);

        assert_eq!(
            resolver.recalculate(text, &Scope::direct(0, 3), 2),
            Err(AnnotationError::MissingScopeText(2))
        );
        assert_eq!(
            resolver.recalculate(text, &Scope::described("zebra"), 0),
            Err(AnnotationError::Unresolved("zebra".into()))
        );
    }

    #[test]
    fn test_scored_policy_prefers_exact_length_then_left() {
        let config = EditorConfig { tie_break: TieBreak::Scored, ..Default::default() };
        let resolver = SpanResolver::new(&config);
        let resolved = resolver.resolve_scope_positions("aXbXc", &Scope::described("X"));
        assert_eq!(positions(&resolved), vec![TextRange::new(1, 2)]);

        assert!(score_candidate(TextRange::new(0, 4), 4, 10) > score_candidate(TextRange::new(5, 9), 4, 10));
        assert!(score_candidate(TextRange::new(5, 9), 4, 10) > score_candidate(TextRange::new(0, 2), 4, 10));
    }
}
