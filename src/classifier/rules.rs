use super::types::{ClassificationResult, ClassifierConfig, RejectReason};
use crate::text::NormalizedSpan;

/// Structural and symmetry gate in front of the dictionary stage.
#[derive(Debug, Clone, Default)]
pub struct PalindromeClassifier {
    config: ClassifierConfig,
}

impl PalindromeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Runs the rule chain against `span`.
    ///
    /// Consumes the span so a candidate can hand it on without copying.
    pub fn classify(&self, span: NormalizedSpan) -> ClassificationResult {
        match self.first_violation(span.as_bytes()) {
            Some(reason) => ClassificationResult::rejected(reason),
            None => ClassificationResult::Candidate { span },
        }
    }

    /// Returns the first rule `cleaned` breaks, in the fixed rule order.
    pub fn first_violation(&self, cleaned: &[u8]) -> Option<RejectReason> {
        if cleaned.is_empty() {
            return Some(RejectReason::NoLetters);
        }

        if cleaned.len() < self.config.min_phrase_length {
            return Some(RejectReason::TooShort {
                length: cleaned.len(),
                minimum: self.config.min_phrase_length,
            });
        }

        let distinct = distinct_count(cleaned);

        if distinct == 1 {
            return Some(RejectReason::SingleCharacter);
        }

        if is_alternating_pair(cleaned) {
            return Some(RejectReason::AlternatingPair);
        }

        if distinct == 2 && is_framed_repeat(cleaned) {
            return Some(RejectReason::FramedRepeat);
        }

        if let Some(limit) = self.config.max_repeat_run {
            let run = longest_run(cleaned);
            if run > limit {
                return Some(RejectReason::RepeatedRun { run, limit });
            }
        }

        if !is_palindrome(cleaned) {
            return Some(RejectReason::NotPalindrome);
        }

        None
    }
}

fn distinct_count(cleaned: &[u8]) -> usize {
    let mut seen = [false; 256];
    let mut count = 0;
    for &b in cleaned {
        if !seen[b as usize] {
            seen[b as usize] = true;
            count += 1;
        }
    }
    count
}

/// True when the whole text is `xyxy...` for two distinct characters.
///
/// `(yx)*` needs no separate check: relabelling the pair from the first two
/// characters covers both phases.
pub fn is_alternating_pair(cleaned: &[u8]) -> bool {
    if cleaned.len() < 2 {
        return false;
    }

    let (x, y) = (cleaned[0], cleaned[1]);
    if x == y {
        return false;
    }

    cleaned
        .iter()
        .enumerate()
        .all(|(i, &c)| if i % 2 == 0 { c == x } else { c == y })
}

/// True when the ends match and everything in between is the second character,
/// e.g. "wooooow" or "lool".
pub fn is_framed_repeat(cleaned: &[u8]) -> bool {
    let n = cleaned.len();
    if n < 3 || cleaned[0] != cleaned[n - 1] {
        return false;
    }

    let middle = cleaned[1];
    cleaned[1..n - 1].iter().all(|&c| c == middle)
}

pub fn longest_run(cleaned: &[u8]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<u8> = None;

    for &c in cleaned {
        if previous == Some(c) {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }

    longest
}

/// Two-pointer comparison from both ends inward.
pub fn is_palindrome(cleaned: &[u8]) -> bool {
    if cleaned.is_empty() {
        return true;
    }

    let (mut a, mut b) = (0, cleaned.len() - 1);
    while a < b {
        if cleaned[a] != cleaned[b] {
            return false;
        }
        a += 1;
        b -= 1;
    }
    true
}
