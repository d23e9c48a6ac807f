use serde::{Deserialize, Serialize};

/// Canonical comparison form of a raw string plus the slice of the input it came from.
///
/// `cleaned` only ever holds lower-case ASCII letters, so byte indexing into it is
/// always on a character boundary. `start_offset..end_offset` is the byte range of
/// `original` inside the raw input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedSpan {
    pub original: String,
    pub cleaned: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl NormalizedSpan {
    /// The span produced when no letter survives filtering.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cleaned.is_empty()
    }

    /// Number of retained letters.
    pub fn len(&self) -> usize {
        self.cleaned.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.cleaned.as_bytes()
    }
}
