//! Crate error type.
//!
//! Every public operation of the editing core returns one of these instead of
//! panicking. Validation errors leave session state untouched; transport
//! errors carry the persist layer's message verbatim.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Which annotation list an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Cue,
    Scope,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Cue => "cue",
            AnnotationKind::Scope => "scope",
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotationError {
    #[error("Invalid scope bounds [{start}-{end}] for text of length {len}")]
    InvalidBounds { start: i64, end: i64, len: usize },

    #[error("Scope [{start}-{end}] overlaps existing scope #{existing}")]
    Overlap {
        start: usize,
        end: usize,
        existing: usize,
    },

    #[error("No {kind} at index {index} (have {len})")]
    IndexOutOfRange {
        kind: AnnotationKind,
        index: usize,
        len: usize,
    },

    #[error("No document loaded")]
    NoDocument,

    #[error("No edits to save")]
    NothingToSave,

    #[error("Scope text has no match in document: {0:?}")]
    Unresolved(String),

    #[error("Scope #{0} has no text description to resolve")]
    MissingScopeText(usize),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl AnnotationError {
    /// True for errors raised by local validation (state is unchanged)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnnotationError::InvalidBounds { .. }
                | AnnotationError::Overlap { .. }
                | AnnotationError::IndexOutOfRange { .. }
                | AnnotationError::NoDocument
                | AnnotationError::NothingToSave
        )
    }
}
