//! Annotation records: documents with cue and scope spans.
//!
//! Records arrive as JSON from the external store and go back to it on save,
//! so every type keeps unknown fields in `extra` and position entries keep
//! their raw JSON value. Offsets are character offsets into `Document::text`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::span::TextRange;

// =============================================================================
// Identifiers & Segments
// =============================================================================

/// Record identifier as produced by the store (number or string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId::Number(n.into())
    }
}

/// One `[start, end]` position entry, kept as raw JSON.
///
/// Entries that are not a pair of non-negative integers are malformed:
/// `range()` returns `None` for them and they are skipped when rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Segment(pub Value);

impl Segment {
    pub fn range(&self) -> Option<TextRange> {
        let pair = self.0.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        let start = as_offset(&pair[0])?;
        let end = as_offset(&pair[1])?;
        if start > end {
            return None;
        }
        Some(TextRange::new(start, end))
    }

    /// Two-element array of numbers, whatever their values
    pub fn is_numeric_pair(&self) -> bool {
        matches!(self.0.as_array(), Some(pair) if pair.len() == 2 && pair.iter().all(Value::is_number))
    }
}

impl From<TextRange> for Segment {
    fn from(range: TextRange) -> Self {
        Segment(Value::from(vec![range.start, range.end]))
    }
}

/// Non-negative integer offset; integral floats (`4.0`) are accepted
fn as_offset(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 {
        Some(f as usize)
    } else {
        None
    }
}

// Field decoders. A record with one odd field keeps its slot: the field
// falls back to its empty value instead of failing the whole record.

fn lenient_offset<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_offset(&value))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strings as-is, null as empty, anything else in its JSON form
fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

fn lenient_segments<'de, D>(deserializer: D) -> Result<Vec<Segment>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_segments(deserializer)?.unwrap_or_default())
}

fn lenient_optional_segments<'de, D>(deserializer: D) -> Result<Option<Vec<Segment>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items.into_iter().map(Segment).collect()),
        _ => None,
    })
}

fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => decode_records(items),
        _ => Vec::new(),
    })
}

/// Decode one record per value. Undecodable values become empty records so
/// positions in the list (and the indices the renderer reports) are kept.
pub fn decode_records<T: DeserializeOwned + Default>(values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                crate::console_warn!("[model] Record {} unreadable, kept empty: {}", i, e);
                T::default()
            })
        })
        .collect()
}

fn segment_ranges(segments: &[Segment]) -> Vec<TextRange> {
    segments.iter().filter_map(Segment::range).collect()
}

// =============================================================================
// Cue
// =============================================================================

/// Trigger marker, possibly spread over several segments.
/// Positions are fixed by the producer and never recomputed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cue {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub cue_label: String,
    #[serde(default, deserialize_with = "lenient_label")]
    pub group: String,
    #[serde(default, deserialize_with = "lenient_segments")]
    pub positions: Vec<Segment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cue {
    pub fn new(id: impl Into<RecordId>, label: &str, group: &str, ranges: &[TextRange]) -> Self {
        Cue {
            id: Some(id.into()),
            cue_label: label.to_string(),
            group: group.to_string(),
            positions: ranges.iter().copied().map(Segment::from).collect(),
            extra: Map::new(),
        }
    }

    /// Well-formed segments in stored order
    pub fn segments(&self) -> Vec<TextRange> {
        segment_ranges(&self.positions)
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Negation/modality extent.
///
/// Either resolved (`positions`, or a direct `start`/`end` pair for scopes
/// added by hand) or unresolved with only a `scope` text description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_offset", skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, deserialize_with = "lenient_offset", skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_segments",
        skip_serializing_if = "Option::is_none"
    )]
    pub positions: Option<Vec<Segment>>,
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub calculated: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scope {
    /// Scope added by hand with a single direct range
    pub fn direct(start: usize, end: usize) -> Self {
        Scope {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    /// Scope known only by its text description
    pub fn described(text: &str) -> Self {
        Scope {
            scope: Some(text.to_string()),
            ..Default::default()
        }
    }

    /// `positions` is present, non-empty, and every entry is a numeric pair.
    /// Pairs that cannot be drawn (reversed, negative, fractional) still count:
    /// the producer's positions are kept and the renderer skips them.
    pub fn has_valid_positions(&self) -> bool {
        match &self.positions {
            Some(positions) => !positions.is_empty() && positions.iter().all(Segment::is_numeric_pair),
            None => false,
        }
    }

    /// Concrete segments: `positions` when present, else `start`/`end`
    pub fn segments(&self) -> Vec<TextRange> {
        if let Some(positions) = self.positions.as_ref().filter(|p| !p.is_empty()) {
            return segment_ranges(positions);
        }
        match (self.start, self.end) {
            (Some(start), Some(end)) if start < end => vec![TextRange::new(start, end)],
            _ => Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.segments().is_empty()
    }

    pub fn is_calculated(&self) -> bool {
        self.calculated.unwrap_or(false)
    }

    /// Leftmost segment start, used to keep scope lists ordered
    pub fn first_start(&self) -> Option<usize> {
        self.segments().iter().map(|r| r.start).min()
    }
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub text: String,
    #[serde(default, deserialize_with = "lenient_records")]
    pub cues: Vec<Cue>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub scopes: Vec<Scope>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<RecordId>, text: &str) -> Self {
        Document {
            id: id.into(),
            text: text.to_string(),
            cues: Vec::new(),
            scopes: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_cues(mut self, cues: Vec<Cue>) -> Self {
        self.cues = cues;
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<Scope>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Text length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
