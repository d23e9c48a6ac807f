use crate::classifier::{ClassificationResult, ClassifierConfig, PalindromeClassifier, RejectReason};
use crate::segmenter::{Dictionary, DictionarySegmenter, SegmentationResult};
use crate::text::{normalize, NormalizedSpan};

use std::sync::Arc;

/// A confirmed palindrome: the span that passed classification and its word splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub span: NormalizedSpan,
    pub segmentation: SegmentationResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(Detection),
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// The full classification chain: normalize, classify, segment.
///
/// Synchronous and total. It performs no I/O, so it is safe to run directly on a
/// worker without yielding.
#[derive(Debug, Clone)]
pub struct PalindromeDetector {
    classifier: PalindromeClassifier,
    segmenter: DictionarySegmenter,
}

impl PalindromeDetector {
    pub fn new(config: ClassifierConfig, dictionary: Arc<Dictionary>) -> Self {
        Self {
            classifier: PalindromeClassifier::new(config),
            segmenter: DictionarySegmenter::new(dictionary),
        }
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        self.classifier.classify(normalize(text))
    }

    pub fn detect(&self, text: &str) -> Verdict {
        let span = match self.classify(text) {
            ClassificationResult::Candidate { span } => span,
            ClassificationResult::Rejected { reason } => return Verdict::Rejected(reason),
        };

        let segmentation = self.segmenter.segment(&span.cleaned);
        if segmentation.is_empty() {
            return Verdict::Rejected(RejectReason::NoSegmentation);
        }

        Verdict::Accepted(Detection { span, segmentation })
    }
}
