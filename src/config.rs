//! Editor configuration
//!
//! Passed from JS as a plain object; every field is optional.

use serde::{Deserialize, Serialize};

/// How the resolver picks among several occurrences of the same text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// First occurrence in document order
    #[default]
    Leftmost,
    /// Highest `0.7 * length ratio + 0.3 * left preference`, leftmost on ties
    Scored,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EditorConfig {
    #[serde(default)]
    pub tie_break: TieBreak,
    /// Shortest keyword tried when a scope part has no exact match
    #[serde(default = "default_min_keyword_len")]
    pub min_keyword_len: usize,
    /// Separator between parts of a discontinuous scope description
    #[serde(default = "default_part_separator")]
    pub part_separator: char,
    /// Grapheme budget for scope previews in list views
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    /// Emit the tooltip caption inside each mark
    #[serde(default = "default_true")]
    pub tooltips: bool,
}

fn default_min_keyword_len() -> usize { 3 }
fn default_part_separator() -> char { ',' }
fn default_preview_chars() -> usize { 50 }
fn default_true() -> bool { true }

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::Leftmost,
            min_keyword_len: default_min_keyword_len(),
            part_separator: default_part_separator(),
            preview_chars: default_preview_chars(),
            tooltips: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config: EditorConfig =
            serde_json::from_str(r#"{"tie_break": "scored", "preview_chars": 20}"#).unwrap();
        assert_eq!(config.tie_break, TieBreak::Scored);
        assert_eq!(config.preview_chars, 20);
        assert_eq!(config.min_keyword_len, 3);
        assert!(config.tooltips);
    }
}
