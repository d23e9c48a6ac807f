//! Dictionary Segmentation Module
//!
//! Confirms that a palindrome candidate is made of real words.
//!
//! ## Overview
//! A candidate's cleaned text has no spaces, so it is decomposed back into words by
//! searching every split point against a dictionary. A phrase is accepted only when
//! at least one decomposition covers the whole string.
//!
//! ## Submodules
//! - **`dictionary`**: Loading and holding the immutable word set.
//! - **`segmenter`**: Exhaustive backtracking search with suffix-reachability pruning.
//! - **`types`**: The `SegmentationResult` returned to callers.

pub mod dictionary;
pub mod segmenter;
pub mod types;

pub use dictionary::{Dictionary, DictionaryError};
pub use segmenter::{segment, DictionarySegmenter};
pub use types::SegmentationResult;
