//! Text Normalization Module
//!
//! Turns raw post text into the canonical form used for symmetry checks.
//!
//! ## Overview
//! Every downstream stage compares letters only. Punctuation, digits, whitespace,
//! non-English letters and emoji are stripped, and the remaining ASCII letters are
//! lower-cased. The verbatim slice of the input between the first and last kept
//! letter is preserved so a reply can quote the author exactly.
//!
//! ## Submodules
//! - **`normalizer`**: The code point filter and span extraction.
//! - **`types`**: The `NormalizedSpan` data model.

pub mod normalizer;
pub mod types;

pub use normalizer::{is_emoji, is_english_letter, normalize};
pub use types::NormalizedSpan;
