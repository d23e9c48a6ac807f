//! Palindrome Classification Module
//!
//! Decides whether a normalized span is a palindrome candidate worth a dictionary lookup.
//!
//! ## Rule Order
//! Rules short-circuit on the first failure and always run in this order:
//! 1. Minimum length after normalization.
//! 2. Single distinct character ("aaaaaa").
//! 3. Strict two-character alternation ("hahaha", "lolol").
//! 4. Framed repeat: two distinct characters, matching ends, one repeated middle character ("wooooow").
//! 5. Optional run-length limit (off unless configured).
//! 6. Two-pointer palindrome check.
//!
//! The anti-pattern rules come before the symmetry check because laughter and filler
//! are symmetric yet meaningless, and they must never reach the exponential
//! segmentation stage.

pub mod rules;
pub mod types;

pub use rules::PalindromeClassifier;
pub use types::{ClassificationResult, ClassifierConfig, RejectReason};
