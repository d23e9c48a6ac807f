use crate::text::NormalizedSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MIN_PHRASE_LENGTH: usize = 6;

/// Why a span (or a whole event) was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Nothing survived normalization.
    NoLetters,
    TooShort { length: usize, minimum: usize },
    SingleCharacter,
    AlternatingPair,
    FramedRepeat,
    RepeatedRun { run: usize, limit: usize },
    NotPalindrome,
    /// Symmetric and structurally sound, but no dictionary cover exists.
    NoSegmentation,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoLetters => write!(f, "no letters"),
            RejectReason::TooShort { length, minimum } => {
                write!(f, "too short ({} < {})", length, minimum)
            }
            RejectReason::SingleCharacter => write!(f, "single repeated character"),
            RejectReason::AlternatingPair => write!(f, "two-character alternation"),
            RejectReason::FramedRepeat => write!(f, "framed repeated character"),
            RejectReason::RepeatedRun { run, limit } => {
                write!(f, "run of {} identical characters (limit {})", run, limit)
            }
            RejectReason::NotPalindrome => write!(f, "not a palindrome"),
            RejectReason::NoSegmentation => write!(f, "no dictionary segmentation"),
        }
    }
}

/// Outcome of the structural and symmetry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationResult {
    Rejected { reason: RejectReason },
    /// Passed every check; still needs a dictionary segmentation to be accepted.
    Candidate { span: NormalizedSpan },
}

impl ClassificationResult {
    pub fn rejected(reason: RejectReason) -> Self {
        ClassificationResult::Rejected { reason }
    }

    pub fn is_candidate(&self) -> bool {
        matches!(self, ClassificationResult::Candidate { .. })
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            ClassificationResult::Rejected { reason } => Some(reason),
            ClassificationResult::Candidate { .. } => None,
        }
    }
}

/// Tunables for [`super::PalindromeClassifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum number of letters after normalization.
    pub min_phrase_length: usize,
    /// Reject when one character repeats more than this many times in a row.
    /// `None` disables the rule.
    pub max_repeat_run: Option<usize>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_phrase_length: DEFAULT_MIN_PHRASE_LENGTH,
            max_repeat_run: None,
        }
    }
}
