//! TextIndex: character/byte offset mapping and substring search
//!
//! Annotation offsets count characters, Rust strings index bytes. The index
//! keeps one byte offset per character boundary so both directions are a
//! lookup or a binary search.

use aho_corasick::AhoCorasick;

use super::range::TextRange;

#[derive(Debug, Clone)]
pub struct TextIndex<'a> {
    text: &'a str,
    /// Byte offset of every char boundary, including the final `text.len()`
    boundaries: Vec<usize>,
}

impl<'a> TextIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        boundaries.push(text.len());
        TextIndex { text, boundaries }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte offset of a character offset, `None` past the end
    pub fn byte_of(&self, char_offset: usize) -> Option<usize> {
        self.boundaries.get(char_offset).copied()
    }

    /// Character offset of a byte offset that sits on a char boundary
    pub fn char_of(&self, byte_offset: usize) -> Option<usize> {
        self.boundaries.binary_search(&byte_offset).ok()
    }

    /// Text covered by a character range
    pub fn slice(&self, range: TextRange) -> Option<&'a str> {
        if range.start > range.end {
            return None;
        }
        let start = self.byte_of(range.start)?;
        let end = self.byte_of(range.end)?;
        Some(&self.text[start..end])
    }

    /// Every occurrence of `needle`, overlapping matches included, in
    /// document order. Character offsets.
    pub fn find_all(&self, needle: &str) -> Vec<TextRange> {
        if needle.is_empty() {
            return Vec::new();
        }
        let automaton = match AhoCorasick::new([needle]) {
            Ok(ac) => ac,
            Err(e) => {
                crate::console_warn!("[TextIndex] Could not build matcher for {:?}: {}", needle, e);
                return Vec::new();
            }
        };

        let needle_chars = needle.chars().count();
        automaton
            .find_overlapping_iter(self.text)
            .filter_map(|m| self.char_of(m.start()))
            .map(|start| TextRange::new(start, start + needle_chars))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets() {
        let index = TextIndex::new("hello");
        assert_eq!(index.char_len(), 5);
        assert_eq!(index.byte_of(5), Some(5));
        assert_eq!(index.byte_of(6), None);
        assert_eq!(index.slice(TextRange::new(1, 3)), Some("el"));
    }

    #[test]
    fn test_multibyte_offsets_are_characters() {
        let index = TextIndex::new("pas été là");
        assert_eq!(index.char_len(), 10);
        assert_eq!(index.slice(TextRange::new(4, 7)), Some("été"));
        assert_eq!(index.find_all("là"), vec![TextRange::new(8, 10)]);
    }

    #[test]
    fn test_find_all_overlapping() {
        let index = TextIndex::new("aaaa");
        assert_eq!(
            index.find_all("aa"),
            vec![TextRange::new(0, 2), TextRange::new(1, 3), TextRange::new(2, 4)]
        );
    }

    #[test]
    fn test_find_all_leftmost_first() {
        let index = TextIndex::new("aXbXc");
        assert_eq!(index.find_all("X"), vec![TextRange::new(1, 2), TextRange::new(3, 4)]);
        assert!(index.find_all("Y").is_empty());
        assert!(index.find_all("").is_empty());
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let index = TextIndex::new("abc");
        assert_eq!(index.slice(TextRange { start: 2, end: 9 }), None);
    }
}
