//! Half-open character ranges over document text.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Text range `[start, end)` in character offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "TextRange: start must be <= end");
        TextRange { start, end }
    }

    pub fn from_range(range: Range<usize>) -> Self {
        TextRange::new(range.start, range.end)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open overlap test; touching ranges do not overlap
    pub fn overlaps(&self, other: &TextRange) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Non-empty and fully inside a text of `text_len` characters
    pub fn fits(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        TextRange::from_range(range)
    }
}

impl From<(usize, usize)> for TextRange {
    fn from((start, end): (usize, usize)) -> Self {
        TextRange::new(start, end)
    }
}

/// Merge overlapping or touching ranges into a sorted disjoint list
pub fn merge_ranges(ranges: &[TextRange]) -> Vec<TextRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|r| r.start);

    let mut merged: Vec<TextRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Total number of characters covered by `ranges`, counting overlap once
pub fn covered_len(ranges: &[TextRange]) -> usize {
    merge_ranges(ranges).iter().map(TextRange::len).sum()
}
